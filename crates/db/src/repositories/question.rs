//! Question repository.

use std::sync::Arc;

use crate::entities::{Question, question};
use quorum_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    Order, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select,
    sea_query::{Expr, extension::postgres::PgExpr},
};

/// Sort order for question listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QuestionSort {
    #[default]
    Newest,
    Oldest,
    Votes,
    Views,
    Answers,
}

impl QuestionSort {
    /// Parse a `sort` query parameter. Unknown values fall back to newest.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "oldest" => Self::Oldest,
            "votes" => Self::Votes,
            "views" => Self::Views,
            "answers" => Self::Answers,
            _ => Self::Newest,
        }
    }
}

/// Filters shared by list and search.
#[derive(Debug, Clone, Default)]
pub struct QuestionQuery {
    pub category: Option<String>,
    pub difficulty: Option<question::Difficulty>,
    /// Match questions carrying any of these tags.
    pub tags: Vec<String>,
    pub author_id: Option<String>,
    pub has_accepted_answer: Option<bool>,
    /// Case-insensitive substring match on title or content.
    pub text: Option<String>,
    pub sort: QuestionSort,
}

impl QuestionQuery {
    fn apply(&self, mut query: Select<Question>) -> Select<Question> {
        query = query.filter(question::Column::IsDeleted.eq(false));

        if let Some(category) = &self.category {
            query = query.filter(question::Column::Category.eq(category.as_str()));
        }
        if let Some(difficulty) = self.difficulty {
            query = query.filter(question::Column::Difficulty.eq(difficulty));
        }
        if let Some(author_id) = &self.author_id {
            query = query.filter(question::Column::UserId.eq(author_id.as_str()));
        }
        match self.has_accepted_answer {
            Some(true) => query = query.filter(question::Column::AcceptedAnswerId.is_not_null()),
            Some(false) => query = query.filter(question::Column::AcceptedAnswerId.is_null()),
            None => {}
        }

        if !self.tags.is_empty() {
            // PostgreSQL: tags @> '["tag"]'::jsonb, any of the given tags
            let mut any_tag = Condition::any();
            for tag in &self.tags {
                any_tag = any_tag.add(Expr::cust_with_values(
                    "tags @> $1",
                    [serde_json::json!([tag.to_lowercase()])],
                ));
            }
            query = query.filter(any_tag);
        }

        if let Some(text) = &self.text {
            let pattern = format!("%{}%", text.replace('%', "\\%").replace('_', "\\_"));
            query = query.filter(
                Condition::any()
                    .add(Expr::col(question::Column::Title).ilike(pattern.clone()))
                    .add(Expr::col(question::Column::Content).ilike(pattern)),
            );
        }

        match self.sort {
            QuestionSort::Newest => query.order_by_desc(question::Column::Id),
            QuestionSort::Oldest => query.order_by_asc(question::Column::Id),
            QuestionSort::Votes => query
                .order_by(Expr::cust("upvotes_count - downvotes_count"), Order::Desc)
                .order_by_desc(question::Column::Id),
            QuestionSort::Views => query
                .order_by_desc(question::Column::Views)
                .order_by_desc(question::Column::Id),
            QuestionSort::Answers => query
                .order_by_desc(question::Column::AnswersCount)
                .order_by_desc(question::Column::Id),
        }
    }
}

/// Question repository for database operations.
#[derive(Clone)]
pub struct QuestionRepository {
    db: Arc<DatabaseConnection>,
}

impl QuestionRepository {
    /// Create a new question repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a question by ID, including soft-deleted ones.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a question that has not been deleted.
    pub async fn get_visible(&self, id: &str) -> AppResult<question::Model> {
        self.find_by_id(id)
            .await?
            .filter(|q| !q.is_deleted)
            .ok_or_else(|| AppError::QuestionNotFound(id.to_string()))
    }

    /// Create a new question.
    pub async fn create(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a question.
    pub async fn update(&self, model: question::ActiveModel) -> AppResult<question::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// List questions matching the filters, one page at a time.
    ///
    /// Returns the page and the total number of matches.
    pub async fn list(
        &self,
        filter: &QuestionQuery,
        limit: u64,
        offset: u64,
    ) -> AppResult<(Vec<question::Model>, u64)> {
        let query = filter.apply(Question::find());

        let total = query
            .clone()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let items = query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((items, total))
    }

    /// Increment views atomically (single UPDATE query, no fetch).
    pub async fn increment_views(&self, id: &str) -> AppResult<()> {
        Question::update_many()
            .col_expr(
                question::Column::Views,
                Expr::col(question::Column::Views).add(1),
            )
            .filter(question::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Increment answers count atomically.
    pub async fn increment_answers_count(&self, id: &str) -> AppResult<()> {
        Question::update_many()
            .col_expr(
                question::Column::AnswersCount,
                Expr::col(question::Column::AnswersCount).add(1),
            )
            .filter(question::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Decrement answers count atomically.
    pub async fn decrement_answers_count(&self, id: &str) -> AppResult<()> {
        Question::update_many()
            .col_expr(
                question::Column::AnswersCount,
                Expr::cust("GREATEST(answers_count - 1, 0)"),
            )
            .filter(question::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ==================== Transactional steps ====================

    /// Load a question and lock its row until the transaction ends.
    pub async fn find_for_update<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<question::Model>> {
        Question::find_by_id(id)
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

        Question::update_many()
            .col_expr(
                question::Column::UpvotesCount,
                Expr::col(question::Column::UpvotesCount).add(up_delta),
            )
            .col_expr(
                question::Column::DownvotesCount,
                Expr::col(question::Column::DownvotesCount).add(down_delta),
            )
            .filter(question::Column::Id.eq(id))
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
        Question::update_many()
            .col_expr(question::Column::UpvotesCount, Expr::value(upvotes))
            .col_expr(question::Column::DownvotesCount, Expr::value(downvotes))
            .filter(question::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Point the question at its accepted answer, bumping `version`.
    ///
    /// Compare-and-set on `expected_version`: if another writer changed the
    /// question since it was read, nothing is written and `Conflict` is returned.
    pub async fn set_accepted_answer<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        answer_id: Option<&str>,
        expected_version: i32,
    ) -> AppResult<()> {
        let result = Question::update_many()
            .col_expr(
                question::Column::AcceptedAnswerId,
                Expr::value(answer_id.map(str::to_string)),
            )
            .col_expr(
                question::Column::Version,
                Expr::col(question::Column::Version).add(1),
            )
            .col_expr(question::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(question::Column::Id.eq(id))
            .filter(question::Column::Version.eq(expected_version))
            .exec(conn)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected == 0 {
            tracing::warn!(question_id = %id, expected_version, "Question version moved");
            return Err(AppError::Conflict(format!(
                "Question {id} was modified concurrently"
            )));
        }
        Ok(())
    }
}
