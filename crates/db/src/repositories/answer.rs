//! Answer repository.

use std::sync::Arc;

use crate::entities::{Answer, answer};
use quorum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, sea_query::Expr,
};

/// Answer repository for database operations.
#[derive(Clone)]
pub struct AnswerRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerRepository {
    /// Create a new answer repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an answer by ID, including soft-deleted ones.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get an answer that has not been deleted.
    pub async fn get_visible(&self, id: &str) -> AppResult<answer::Model> {
        self.find_by_id(id)
            .await?
            .filter(|a| !a.is_deleted)
            .ok_or_else(|| AppError::AnswerNotFound(id.to_string()))
    }

    /// Answers to a question in insertion order, deleted ones excluded.
    pub async fn find_by_question(&self, question_id: &str) -> AppResult<Vec<answer::Model>> {
        Answer::find()
            .filter(answer::Column::QuestionId.eq(question_id))
            .filter(answer::Column::IsDeleted.eq(false))
            .order_by_asc(answer::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new answer.
    pub async fn create(&self, model: answer::ActiveModel) -> AppResult<answer::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update an answer.
    pub async fn update(&self, model: answer::ActiveModel) -> AppResult<answer::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Transactional steps ====================

    /// Load an answer and lock its row until the transaction ends.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<answer::Model>> {
        Answer::find_by_id(id)
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Shift the cached vote counters.
    pub async fn adjust_vote_counts<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        up_delta: i32,
        down_delta: i32,
    ) -> AppResult<()> {
        if up_delta == 0 && down_delta == 0 {
            return Ok(());
        }

        Answer::update_many()
            .col_expr(
                answer::Column::UpvotesCount,
                Expr::col(answer::Column::UpvotesCount).add(up_delta),
            )
            .col_expr(
                answer::Column::DownvotesCount,
                Expr::col(answer::Column::DownvotesCount).add(down_delta),
            )
            .filter(answer::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Overwrite the cached vote counters.
    pub async fn set_vote_counts<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        upvotes: i32,
        downvotes: i32,
    ) -> AppResult<()> {
        Answer::update_many()
            .col_expr(answer::Column::UpvotesCount, Expr::value(upvotes))
            .col_expr(answer::Column::DownvotesCount, Expr::value(downvotes))
            .filter(answer::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Flip the accepted flag of one answer.
    pub async fn set_accepted<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        accepted: bool,
    ) -> AppResult<()> {
        Answer::update_many()
            .col_expr(answer::Column::IsAccepted, Expr::value(accepted))
            .col_expr(answer::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(answer::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Count accepted answers written by a user, deleted ones included.
    pub async fn count_accepted_by_author<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
    ) -> AppResult<u64> {
        Answer::find()
            .filter(answer::Column::UserId.eq(user_id))
            .filter(answer::Column::IsAccepted.eq(true))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
