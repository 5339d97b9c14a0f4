//! User repository.

use std::sync::Arc;

use crate::entities::{User, user};
use quorum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, sea_query::Expr,
};

use super::map_write_err;

/// User repository for database operations.
#[derive(Clone)]
pub struct UserRepository {
    db: Arc<DatabaseConnection>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<user::Model>> {
        User::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<user::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find users by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<user::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by email (case-insensitive).
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::Email.eq(email.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a user by username (case-insensitive).
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<user::Model>> {
        User::find()
            .filter(user::Column::UsernameLower.eq(username.to_lowercase()))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new user.
    ///
    /// A racing registration with the same email or username surfaces as `Conflict`.
    pub async fn create(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| map_write_err(e, "User"))
    }

    /// Update a user.
    pub async fn update(&self, model: user::ActiveModel) -> AppResult<user::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Record a login.
    pub async fn touch_last_seen(&self, user_id: &str) -> AppResult<()> {
        let model = user::ActiveModel {
            id: Set(user_id.to_string()),
            last_seen_at: Set(Some(chrono::Utc::now().into())),
            ..Default::default()
        };

        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ==================== Transactional steps ====================

    /// Apply a reputation delta atomically, never going below zero.
    ///
    /// Single `UPDATE ... SET reputation = GREATEST(reputation + $1, 0)`,
    /// so concurrent deltas on the same author cannot lose updates.
    pub async fn add_reputation<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        delta: i32,
    ) -> AppResult<()> {
        if delta == 0 {
            return Ok(());
        }

        User::update_many()
            .col_expr(
                user::Column::Reputation,
                Expr::cust_with_values("GREATEST(reputation + $1, 0)", [delta]),
            )
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite the stored reputation (used by reconciliation).
    pub async fn set_reputation<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        reputation: i32,
    ) -> AppResult<()> {
        let result = User::update_many()
            .col_expr(user::Column::Reputation, Expr::value(reputation.max(0)))
            .filter(user::Column::Id.eq(user_id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(AppError::UserNotFound(user_id.to_string()));
        }
        Ok(())
    }

    /// Read a user's current reputation.
    pub async fn reputation_of<C: ConnectionTrait>(conn: &C, user_id: &str) -> AppResult<i32> {
        User::find_by_id(user_id)
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .map(|u| u.reputation)
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))
    }
}
