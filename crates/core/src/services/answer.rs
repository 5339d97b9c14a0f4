//! Answer service.

use quorum_common::{AppError, AppResult, IdGenerator};
use quorum_db::{
    entities::{answer, answer_comment, user},
    repositories::{AnswerCommentRepository, AnswerRepository, QuestionRepository},
};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

use super::question::ensure_can_modify;

/// Answer service for business logic.
#[derive(Clone)]
pub struct AnswerService {
    answer_repo: AnswerRepository,
    question_repo: QuestionRepository,
    comment_repo: AnswerCommentRepository,
    id_gen: IdGenerator,
}

/// Input for answering a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAnswerInput {
    pub question_id: String,

    #[validate(length(min = 10, max = 10000))]
    pub content: String,

    #[validate(length(max = 10000))]
    #[serde(default)]
    pub code_snippet: String,

    #[validate(length(min = 1, max = 30))]
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_language() -> String {
    "text".to_string()
}

/// Input for editing an answer. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAnswerInput {
    #[validate(length(min = 10, max = 10000))]
    pub content: Option<String>,

    #[validate(length(max = 10000))]
    pub code_snippet: Option<String>,

    #[validate(length(min = 1, max = 30))]
    pub language: Option<String>,
}

impl CreateAnswerInput {
    /// Strip surrounding whitespace so length limits apply to real text.
    fn trimmed(mut self) -> Self {
        self.content = self.content.trim().to_string();
        self
    }
}

impl UpdateAnswerInput {
    fn trimmed(mut self) -> Self {
        self.content = self.content.map(|c| c.trim().to_string());
        self
    }
}

/// Input for commenting on an answer.
#[derive(Debug, Deserialize, Validate)]
pub struct AddCommentInput {
    #[validate(length(min = 1, max = 500))]
    pub content: String,
}

impl AnswerService {
    /// Create a new answer service.
    #[must_use]
    pub const fn new(
        answer_repo: AnswerRepository,
        question_repo: QuestionRepository,
        comment_repo: AnswerCommentRepository,
    ) -> Self {
        Self {
            answer_repo,
            question_repo,
            comment_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Post an answer to an open question.
    pub async fn create(&self, user_id: &str, input: CreateAnswerInput) -> AppResult<answer::Model> {
        let input = input.trimmed();
        input.validate()?;

        let question = self.question_repo.get_visible(&input.question_id).await?;
        if question.is_closed {
            return Err(AppError::BadRequest(
                "Cannot answer a closed question".to_string(),
            ));
        }

        let model = answer::ActiveModel {
            id: Set(self.id_gen.generate()),
            question_id: Set(question.id.clone()),
            user_id: Set(user_id.to_string()),
            content: Set(input.content),
            code_snippet: Set(input.code_snippet),
            language: Set(input.language),
            upvotes_count: Set(0),
            downvotes_count: Set(0),
            is_accepted: Set(false),
            is_deleted: Set(false),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let answer = self.answer_repo.create(model).await?;
        self.question_repo
            .increment_answers_count(&question.id)
            .await?;

        tracing::info!(
            answer_id = %answer.id,
            question_id = %question.id,
            user_id = %user_id,
            "Answer created"
        );
        Ok(answer)
    }

    /// Get a visible answer.
    pub async fn get(&self, id: &str) -> AppResult<answer::Model> {
        self.answer_repo.get_visible(id).await
    }

    /// Edit an answer. Only the author or staff may do so.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateAnswerInput,
    ) -> AppResult<answer::Model> {
        let input = input.trimmed();
        input.validate()?;

        let answer = self.answer_repo.get_visible(id).await?;
        ensure_can_modify(actor, &answer.user_id, "update this answer")?;

        let mut active: answer::ActiveModel = answer.into();
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(code_snippet) = input.code_snippet {
            active.code_snippet = Set(code_snippet);
        }
        if let Some(language) = input.language {
            active.language = Set(language);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.answer_repo.update(active).await
    }

    /// Soft delete an answer.
    ///
    /// Acceptance and votes stay on record, so reputation earned by the
    /// answer is unaffected.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let answer = self.answer_repo.get_visible(id).await?;
        ensure_can_modify(actor, &answer.user_id, "delete this answer")?;

        let question_id = answer.question_id.clone();
        let mut active: answer::ActiveModel = answer.into();
        active.is_deleted = Set(true);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.answer_repo.update(active).await?;
        self.question_repo
            .decrement_answers_count(&question_id)
            .await?;

        tracing::info!(answer_id = %id, actor_id = %actor.id, "Answer deleted");
        Ok(())
    }

    /// Append a comment to an answer.
    pub async fn add_comment(
        &self,
        user_id: &str,
        answer_id: &str,
        input: AddCommentInput,
    ) -> AppResult<answer_comment::Model> {
        input.validate()?;
        let content = input.content.trim();
        if content.is_empty() {
            return Err(AppError::Validation(
                "Comment must be between 1 and 500 characters".to_string(),
            ));
        }

        let answer = self.answer_repo.get_visible(answer_id).await?;

        let model = answer_comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            answer_id: Set(answer.id),
            user_id: Set(user_id.to_string()),
            content: Set(content.to_string()),
            created_at: Set(chrono::Utc::now().into()),
        };

        self.comment_repo.create(model).await
    }

    /// Comments on an answer, oldest first.
    pub async fn list_comments(&self, answer_id: &str) -> AppResult<Vec<answer_comment::Model>> {
        self.answer_repo.get_visible(answer_id).await?;
        self.comment_repo.find_by_answer(answer_id).await
    }
}
