//! Question service.

use std::collections::{HashMap, HashSet};

use quorum_common::{AppError, AppResult, IdGenerator};
use quorum_db::{
    entities::{
        answer, answer_comment,
        question::{self, CloseReason, Difficulty},
        user,
        vote::{TargetKind, VoteDirection},
    },
    repositories::{
        AnswerCommentRepository, AnswerRepository, QuestionQuery, QuestionRepository,
        QuestionSort, UserRepository, VoteRepository,
    },
};
use sea_orm::Set;
use serde::Deserialize;
use validator::{Validate, ValidationError};

use super::Page;

/// Categories a question may be filed under.
pub const CATEGORIES: [&str; 27] = [
    "javascript",
    "python",
    "java",
    "cpp",
    "csharp",
    "php",
    "ruby",
    "go",
    "rust",
    "swift",
    "kotlin",
    "typescript",
    "react",
    "vue",
    "angular",
    "nodejs",
    "express",
    "mongodb",
    "sql",
    "aws",
    "docker",
    "kubernetes",
    "devops",
    "algorithms",
    "data-structures",
    "system-design",
    "other",
];

const MAX_TAGS: usize = 10;
const MAX_TAG_LEN: usize = 30;
const DEFAULT_LIMIT: u64 = 10;

fn validate_category(category: &str) -> Result<(), ValidationError> {
    if CATEGORIES.contains(&category) {
        Ok(())
    } else {
        Err(ValidationError::new("category").with_message("Invalid category".into()))
    }
}

/// Lowercase, trim and dedupe tags, keeping first-seen order.
pub fn normalize_tags(raw: &[String]) -> AppResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut tags = Vec::new();

    for tag in raw {
        let tag = tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LEN {
            return Err(AppError::Validation(format!(
                "Tag cannot exceed {MAX_TAG_LEN} characters"
            )));
        }
        if seen.insert(tag.clone()) {
            tags.push(tag);
        }
    }

    if tags.len() > MAX_TAGS {
        return Err(AppError::Validation(format!(
            "A question can have at most {MAX_TAGS} tags"
        )));
    }
    Ok(tags)
}

/// Question service for business logic.
#[derive(Clone)]
pub struct QuestionService {
    question_repo: QuestionRepository,
    answer_repo: AnswerRepository,
    comment_repo: AnswerCommentRepository,
    user_repo: UserRepository,
    vote_repo: VoteRepository,
    id_gen: IdGenerator,
}

/// Input for asking a question.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateQuestionInput {
    #[validate(length(min = 10, max = 200))]
    pub title: String,

    #[validate(length(min = 20, max = 10000))]
    pub content: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[validate(custom(function = "validate_category"))]
    pub category: String,

    #[serde(default)]
    pub difficulty: Difficulty,

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

/// Input for editing a question. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuestionInput {
    #[validate(length(min = 10, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 20, max = 10000))]
    pub content: Option<String>,

    pub tags: Option<Vec<String>>,

    #[validate(custom(function = "validate_category"))]
    pub category: Option<String>,

    pub difficulty: Option<Difficulty>,

    #[validate(length(max = 10000))]
    pub code_snippet: Option<String>,

    #[validate(length(min = 1, max = 30))]
    pub language: Option<String>,
}

impl CreateQuestionInput {
    /// Strip surrounding whitespace so length limits apply to real text.
    fn trimmed(mut self) -> Self {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self
    }
}

impl UpdateQuestionInput {
    fn trimmed(mut self) -> Self {
        self.title = self.title.map(|t| t.trim().to_string());
        self.content = self.content.map(|c| c.trim().to_string());
        self
    }
}

/// Input for closing a question.
#[derive(Debug, Deserialize)]
pub struct CloseQuestionInput {
    pub reason: CloseReason,
}

/// Listing and search parameters, as read from the query string.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListQuestionsInput {
    #[validate(range(min = 1))]
    pub page: Option<u64>,

    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u64>,

    pub category: Option<String>,
    pub difficulty: Option<Difficulty>,

    /// Comma-separated; a question matches if it has any of them.
    pub tags: Option<String>,

    pub author: Option<String>,
    pub has_accepted_answer: Option<bool>,

    /// `newest`, `oldest`, `votes`, `views` or `answers`.
    pub sort: Option<String>,

    /// Search text. Required by `search`, ignored by `list`.
    pub q: Option<String>,
}

impl ListQuestionsInput {
    fn to_query(&self) -> QuestionQuery {
        QuestionQuery {
            category: self.category.clone().filter(|c| !c.is_empty()),
            difficulty: self.difficulty,
            tags: self
                .tags
                .as_deref()
                .map(|t| {
                    t.split(',')
                        .map(|s| s.trim().to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            author_id: self.author.clone(),
            has_accepted_answer: self.has_accepted_answer,
            text: None,
            sort: self
                .sort
                .as_deref()
                .map(QuestionSort::parse)
                .unwrap_or_default(),
        }
    }
}

/// A question with its author and the viewer's own vote.
#[derive(Debug, Clone)]
pub struct QuestionView {
    pub question: question::Model,
    pub author: Option<user::Model>,
    pub user_vote: Option<VoteDirection>,
}

/// An answer with its author, comments and the viewer's own vote.
#[derive(Debug, Clone)]
pub struct AnswerView {
    pub answer: answer::Model,
    pub author: Option<user::Model>,
    pub comments: Vec<answer_comment::Model>,
    pub user_vote: Option<VoteDirection>,
}

/// A question page: the question and its answers in insertion order.
#[derive(Debug, Clone)]
pub struct QuestionDetail {
    pub question: QuestionView,
    pub answers: Vec<AnswerView>,
}

impl QuestionService {
    /// Create a new question service.
    #[must_use]
    pub const fn new(
        question_repo: QuestionRepository,
        answer_repo: AnswerRepository,
        comment_repo: AnswerCommentRepository,
        user_repo: UserRepository,
        vote_repo: VoteRepository,
    ) -> Self {
        Self {
            question_repo,
            answer_repo,
            comment_repo,
            user_repo,
            vote_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Ask a new question.
    pub async fn create(
        &self,
        user_id: &str,
        input: CreateQuestionInput,
    ) -> AppResult<question::Model> {
        let input = input.trimmed();
        input.validate()?;
        let tags = normalize_tags(&input.tags)?;

        let model = question::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            title: Set(input.title),
            content: Set(input.content),
            tags: Set(serde_json::json!(tags)),
            category: Set(input.category),
            difficulty: Set(input.difficulty),
            code_snippet: Set(input.code_snippet),
            language: Set(input.language),
            views: Set(0),
            answers_count: Set(0),
            upvotes_count: Set(0),
            downvotes_count: Set(0),
            accepted_answer_id: Set(None),
            is_closed: Set(false),
            closed_by: Set(None),
            closed_reason: Set(None),
            is_deleted: Set(false),
            version: Set(0),
            created_at: Set(chrono::Utc::now().into()),
            updated_at: Set(None),
        };

        let question = self.question_repo.create(model).await?;
        tracing::info!(question_id = %question.id, user_id = %user_id, "Question created");
        Ok(question)
    }

    /// Load a question page and count the view.
    pub async fn get(&self, id: &str, viewer_id: Option<&str>) -> AppResult<QuestionDetail> {
        let mut question = self.question_repo.get_visible(id).await?;
        self.question_repo.increment_views(id).await?;
        question.views += 1;

        let answers = self.answer_repo.find_by_question(id).await?;
        let answer_ids: Vec<String> = answers.iter().map(|a| a.id.clone()).collect();

        let mut comments_by_answer: HashMap<String, Vec<answer_comment::Model>> = HashMap::new();
        for comment in self.comment_repo.find_by_answers(&answer_ids).await? {
            comments_by_answer
                .entry(comment.answer_id.clone())
                .or_default()
                .push(comment);
        }

        let mut author_ids: Vec<String> = answers.iter().map(|a| a.user_id.clone()).collect();
        author_ids.push(question.user_id.clone());
        author_ids.sort();
        author_ids.dedup();
        let authors = self.authors_by_id(&author_ids).await?;

        let (question_vote, answer_votes) = match viewer_id {
            Some(viewer) => {
                let question_vote = self
                    .votes_by_target(viewer, TargetKind::Question, &[question.id.clone()])
                    .await?
                    .remove(&question.id);
                let answer_votes = self
                    .votes_by_target(viewer, TargetKind::Answer, &answer_ids)
                    .await?;
                (question_vote, answer_votes)
            }
            None => (None, HashMap::new()),
        };

        let answers = answers
            .into_iter()
            .map(|answer| AnswerView {
                author: authors.get(&answer.user_id).cloned(),
                comments: comments_by_answer.remove(&answer.id).unwrap_or_default(),
                user_vote: answer_votes.get(&answer.id).copied(),
                answer,
            })
            .collect();

        Ok(QuestionDetail {
            question: QuestionView {
                author: authors.get(&question.user_id).cloned(),
                user_vote: question_vote,
                question,
            },
            answers,
        })
    }

    /// List questions with filters and pagination.
    pub async fn list(
        &self,
        input: &ListQuestionsInput,
        viewer_id: Option<&str>,
    ) -> AppResult<Page<QuestionView>> {
        input.validate()?;
        self.page(input, input.to_query(), viewer_id).await
    }

    /// Case-insensitive text search on title and content.
    pub async fn search(
        &self,
        input: &ListQuestionsInput,
        viewer_id: Option<&str>,
    ) -> AppResult<Page<QuestionView>> {
        input.validate()?;

        let text = input
            .q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::BadRequest("Search query is required".to_string()))?;

        let mut query = input.to_query();
        query.text = Some(text.to_string());
        self.page(input, query, viewer_id).await
    }

    /// Edit a question. Only the author or staff may do so.
    pub async fn update(
        &self,
        actor: &user::Model,
        id: &str,
        input: UpdateQuestionInput,
    ) -> AppResult<question::Model> {
        let input = input.trimmed();
        input.validate()?;

        let question = self.question_repo.get_visible(id).await?;
        ensure_can_modify(actor, &question.user_id, "update this question")?;

        let mut active: question::ActiveModel = question.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }
        if let Some(tags) = input.tags {
            active.tags = Set(serde_json::json!(normalize_tags(&tags)?));
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(difficulty) = input.difficulty {
            active.difficulty = Set(difficulty);
        }
        if let Some(code_snippet) = input.code_snippet {
            active.code_snippet = Set(code_snippet);
        }
        if let Some(language) = input.language {
            active.language = Set(language);
        }
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        self.question_repo.update(active).await
    }

    /// Soft delete a question.
    pub async fn delete(&self, actor: &user::Model, id: &str) -> AppResult<()> {
        let question = self.question_repo.get_visible(id).await?;
        ensure_can_modify(actor, &question.user_id, "delete this question")?;

        let mut active: question::ActiveModel = question.into();
        active.is_deleted = Set(true);
        active.updated_at = Set(Some(chrono::Utc::now().into()));
        self.question_repo.update(active).await?;

        tracing::info!(question_id = %id, actor_id = %actor.id, "Question deleted");
        Ok(())
    }

    /// Close a question so it takes no more answers.
    pub async fn close(
        &self,
        actor: &user::Model,
        id: &str,
        input: CloseQuestionInput,
    ) -> AppResult<question::Model> {
        let question = self.question_repo.get_visible(id).await?;
        ensure_can_modify(actor, &question.user_id, "close this question")?;

        if question.is_closed {
            return Err(AppError::BadRequest("Question is already closed".to_string()));
        }

        let mut active: question::ActiveModel = question.into();
        active.is_closed = Set(true);
        active.closed_by = Set(Some(actor.id.clone()));
        active.closed_reason = Set(Some(input.reason));
        active.updated_at = Set(Some(chrono::Utc::now().into()));

        let question = self.question_repo.update(active).await?;
        tracing::info!(question_id = %id, reason = ?input.reason, "Question closed");
        Ok(question)
    }

    async fn page(
        &self,
        input: &ListQuestionsInput,
        query: QuestionQuery,
        viewer_id: Option<&str>,
    ) -> AppResult<Page<QuestionView>> {
        let page = input.page.unwrap_or(1);
        let limit = input.limit.unwrap_or(DEFAULT_LIMIT);

        let (questions, total) = self
            .question_repo
            .list(&query, limit, (page - 1) * limit)
            .await?;

        let mut author_ids: Vec<String> = questions.iter().map(|q| q.user_id.clone()).collect();
        author_ids.sort();
        author_ids.dedup();
        let authors = self.authors_by_id(&author_ids).await?;

        let votes = match viewer_id {
            Some(viewer) => {
                let ids: Vec<String> = questions.iter().map(|q| q.id.clone()).collect();
                self.votes_by_target(viewer, TargetKind::Question, &ids)
                    .await?
            }
            None => HashMap::new(),
        };

        let items = questions
            .into_iter()
            .map(|question| QuestionView {
                author: authors.get(&question.user_id).cloned(),
                user_vote: votes.get(&question.id).copied(),
                question,
            })
            .collect();

        Ok(Page::new(items, page, limit, total))
    }

    async fn authors_by_id(&self, ids: &[String]) -> AppResult<HashMap<String, user::Model>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        Ok(self
            .user_repo
            .find_by_ids(ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u))
            .collect())
    }

    async fn votes_by_target(
        &self,
        viewer_id: &str,
        kind: TargetKind,
        target_ids: &[String],
    ) -> AppResult<HashMap<String, VoteDirection>> {
        Ok(self
            .vote_repo
            .find_by_user_and_targets(viewer_id, kind, target_ids)
            .await?
            .into_iter()
            .map(|v| (v.target_id, v.direction))
            .collect())
    }
}

/// Authors may change their own content; moderators and admins anyone's.
pub(crate) fn ensure_can_modify(
    actor: &user::Model,
    owner_id: &str,
    action: &str,
) -> AppResult<()> {
    if actor.id == owner_id || actor.role.is_staff() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("Not authorized to {action}")))
    }
}
