//! Questions endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use quorum_common::{AppError, AppResult};
use quorum_core::{
    CloseQuestionInput, CreateQuestionInput, ListQuestionsInput, QuestionDetail, QuestionView,
    UpdateQuestionInput, VotedTarget, services::Page,
};
use quorum_db::entities::{
    question::{self, CloseReason, Difficulty},
    vote::{TargetKind, VoteDirection},
};
use serde::Serialize;

use super::{
    answers::{AnswerResponse, VoteRequest, VoteResponse},
    users::AuthorResponse,
};
use crate::{
    extractors::{AuthUser, MaybeAuthUser},
    middleware::AppState,
    response::{ApiResponse, MessageResponse, Pagination},
};

/// Question response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResponse {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub category: String,
    pub difficulty: Difficulty,
    pub code_snippet: String,
    pub language: String,
    pub views: i32,
    pub answers_count: i32,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
    pub accepted_answer_id: Option<String>,
    pub is_closed: bool,
    pub closed_reason: Option<CloseReason>,
    pub user_vote: Option<VoteDirection>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<question::Model> for QuestionResponse {
    fn from(question: question::Model) -> Self {
        Self {
            tags: question.tag_list(),
            vote_score: question.vote_score(),
            id: question.id,
            user_id: question.user_id,
            author: None,
            title: question.title,
            content: question.content,
            category: question.category,
            difficulty: question.difficulty,
            code_snippet: question.code_snippet,
            language: question.language,
            views: question.views,
            answers_count: question.answers_count,
            upvotes: question.upvotes_count,
            downvotes: question.downvotes_count,
            accepted_answer_id: question.accepted_answer_id,
            is_closed: question.is_closed,
            closed_reason: question.closed_reason,
            user_vote: None,
            created_at: question.created_at.to_rfc3339(),
            updated_at: question.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<QuestionView> for QuestionResponse {
    fn from(view: QuestionView) -> Self {
        let mut response = Self::from(view.question);
        response.author = view.author.map(Into::into);
        response.user_vote = view.user_vote;
        response
    }
}

/// A question with its answers.
#[derive(Debug, Serialize)]
pub struct QuestionDetailResponse {
    #[serde(flatten)]
    pub question: QuestionResponse,
    pub answers: Vec<AnswerResponse>,
}

impl From<QuestionDetail> for QuestionDetailResponse {
    fn from(detail: QuestionDetail) -> Self {
        Self {
            question: detail.question.into(),
            answers: detail.answers.into_iter().map(Into::into).collect(),
        }
    }
}

/// One page of questions.
#[derive(Debug, Serialize)]
pub struct QuestionListResponse {
    pub questions: Vec<QuestionResponse>,
    pub pagination: Pagination,
}

impl From<Page<QuestionView>> for QuestionListResponse {
    fn from(page: Page<QuestionView>) -> Self {
        let pagination = Pagination::from(&page);
        Self {
            questions: page.items.into_iter().map(Into::into).collect(),
            pagination,
        }
    }
}

/// List questions.
async fn list(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(input): Query<ListQuestionsInput>,
) -> AppResult<ApiResponse<QuestionListResponse>> {
    let page = state
        .question_service
        .list(&input, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;
    Ok(ApiResponse::ok(page.into()))
}

/// Search questions by title and content.
async fn search(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Query(input): Query<ListQuestionsInput>,
) -> AppResult<ApiResponse<QuestionListResponse>> {
    let page = state
        .question_service
        .search(&input, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;
    Ok(ApiResponse::ok(page.into()))
}

/// Ask a question.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateQuestionInput>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let question = state.question_service.create(&user.id, input).await?;

    let mut response = QuestionResponse::from(question);
    response.author = Some(user.into());
    Ok(ApiResponse::created(response))
}

/// Show a question with its answers.
async fn show(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<QuestionDetailResponse>> {
    let detail = state
        .question_service
        .get(&id, viewer.as_ref().map(|u| u.id.as_str()))
        .await?;
    Ok(ApiResponse::ok(detail.into()))
}

/// Edit a question.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateQuestionInput>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let question = state.question_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(question.into()))
}

/// Soft delete a question.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.question_service.delete(&user, &id).await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Question deleted successfully",
    )))
}

/// Upvote or downvote a question.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<VoteResponse<QuestionResponse>>> {
    let direction = req.direction()?;
    let outcome = state
        .voting_service
        .cast_vote(TargetKind::Question, &id, &user.id, direction)
        .await?;

    let VotedTarget::Question(question) = outcome.target else {
        return Err(AppError::Internal("Vote landed on an answer".to_string()));
    };
    let mut target = QuestionResponse::from(question);
    target.user_vote = Some(outcome.user_vote);

    Ok(ApiResponse::ok(VoteResponse {
        target,
        author_reputation: outcome.author_reputation,
    }))
}

/// Close a question.
async fn close(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<CloseQuestionInput>,
) -> AppResult<ApiResponse<QuestionResponse>> {
    let question = state.question_service.close(&user, &id, input).await?;
    Ok(ApiResponse::ok(question.into()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/search", get(search))
        .route("/{id}", get(show).put(update).delete(delete))
        .route("/{id}/vote", post(vote))
        .route("/{id}/close", post(close))
}
