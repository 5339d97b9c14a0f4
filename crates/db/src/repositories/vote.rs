//! Vote repository.

use std::sync::Arc;

use crate::entities::{
    Answer, Question, Vote, answer, question,
    vote::{self, TargetKind, VoteDirection},
};
use quorum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, QueryTrait, Set,
};

use super::map_write_err;

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// A user's votes on a batch of targets of one kind.
    ///
    /// Used to decorate listings with the caller's own vote state.
    pub async fn find_by_user_and_targets(
        &self,
        user_id: &str,
        kind: TargetKind,
        target_ids: &[String],
    ) -> AppResult<Vec<vote::Model>> {
        if target_ids.is_empty() {
            return Ok(vec![]);
        }

        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetType.eq(kind))
            .filter(vote::Column::TargetId.is_in(target_ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ==================== Transactional steps ====================

    /// Load the voter's vote on a target and lock it.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        kind: TargetKind,
        target_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::TargetType.eq(kind))
            .filter(vote::Column::TargetId.eq(target_id))
            .lock_exclusive()
            .one(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Insert a vote row.
    ///
    /// A racing insert for the same `(voter, target)` fails the unique key and
    /// is reported as `Conflict`.
    pub async fn create<C: ConnectionTrait>(
        conn: &C,
        model: vote::ActiveModel,
    ) -> AppResult<vote::Model> {
        model.insert(conn).await.map_err(|e| map_write_err(e, "Vote"))
    }

    /// Change the direction of an existing vote and refresh its timestamp.
    pub async fn update_direction<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        direction: VoteDirection,
    ) -> AppResult<vote::Model> {
        let model = vote::ActiveModel {
            id: Set(id.to_string()),
            direction: Set(direction),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        model
            .update(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count votes of one direction on a target.
    pub async fn count_for_target<C: ConnectionTrait>(
        conn: &C,
        kind: TargetKind,
        target_id: &str,
        direction: VoteDirection,
    ) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::TargetType.eq(kind))
            .filter(vote::Column::TargetId.eq(target_id))
            .filter(vote::Column::Direction.eq(direction))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count votes of one direction cast on any content a user authored.
    ///
    /// Deleted content is included: its votes still count toward reputation.
    pub async fn count_on_authored<C: ConnectionTrait>(
        conn: &C,
        author_id: &str,
        kind: TargetKind,
        direction: VoteDirection,
    ) -> AppResult<u64> {
        let authored = match kind {
            TargetKind::Question => Question::find()
                .select_only()
                .column(question::Column::Id)
                .filter(question::Column::UserId.eq(author_id))
                .into_query(),
            TargetKind::Answer => Answer::find()
                .select_only()
                .column(answer::Column::Id)
                .filter(answer::Column::UserId.eq(author_id))
                .into_query(),
        };

        Vote::find()
            .filter(vote::Column::TargetType.eq(kind))
            .filter(vote::Column::Direction.eq(direction))
            .filter(vote::Column::TargetId.in_subquery(authored))
            .count(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
