//! Answer comment repository.

use std::sync::Arc;

use crate::entities::{AnswerComment, answer_comment};
use quorum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Answer comment repository for database operations.
#[derive(Clone)]
pub struct AnswerCommentRepository {
    db: Arc<DatabaseConnection>,
}

impl AnswerCommentRepository {
    /// Create a new answer comment repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Append a comment.
    pub async fn create(
        &self,
        model: answer_comment::ActiveModel,
    ) -> AppResult<answer_comment::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on an answer, oldest first.
    pub async fn find_by_answer(&self, answer_id: &str) -> AppResult<Vec<answer_comment::Model>> {
        AnswerComment::find()
            .filter(answer_comment::Column::AnswerId.eq(answer_id))
            .order_by_asc(answer_comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Comments on several answers at once, oldest first.
    pub async fn find_by_answers(
        &self,
        answer_ids: &[String],
    ) -> AppResult<Vec<answer_comment::Model>> {
        if answer_ids.is_empty() {
            return Ok(vec![]);
        }

        AnswerComment::find()
            .filter(answer_comment::Column::AnswerId.is_in(answer_ids.to_vec()))
            .order_by_asc(answer_comment::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_find_by_answer() {
        let comment = answer_comment::Model {
            id: "c1".to_string(),
            answer_id: "a1".to_string(),
            user_id: "user2".to_string(),
            content: "Thanks, that fixed it.".to_string(),
            created_at: Utc::now().into(),
        };

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[comment]])
                .into_connection(),
        );

        let repo = AnswerCommentRepository::new(db);
        let result = repo.find_by_answer("a1").await.unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].user_id, "user2");
    }

    #[tokio::test]
    async fn test_find_by_answers_empty() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = AnswerCommentRepository::new(db);
        assert!(repo.find_by_answers(&[]).await.unwrap().is_empty());
    }
}
