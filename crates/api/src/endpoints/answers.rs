//! Answers endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post, put},
};
use quorum_common::{AppError, AppResult};
use quorum_core::{AddCommentInput, AnswerView, CreateAnswerInput, UpdateAnswerInput, VotedTarget};
use quorum_db::entities::{
    answer, answer_comment,
    vote::{TargetKind, VoteDirection},
};
use serde::{Deserialize, Serialize};

use super::users::AuthorResponse;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// Comment response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub answer_id: String,
    pub user_id: String,
    pub content: String,
    pub created_at: String,
}

impl From<answer_comment::Model> for CommentResponse {
    fn from(comment: answer_comment::Model) -> Self {
        Self {
            id: comment.id,
            answer_id: comment.answer_id,
            user_id: comment.user_id,
            content: comment.content,
            created_at: comment.created_at.to_rfc3339(),
        }
    }
}

/// Answer response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub id: String,
    pub question_id: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<AuthorResponse>,
    pub content: String,
    pub code_snippet: String,
    pub language: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
    pub is_accepted: bool,
    pub user_vote: Option<VoteDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentResponse>>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<answer::Model> for AnswerResponse {
    fn from(answer: answer::Model) -> Self {
        Self {
            vote_score: answer.vote_score(),
            id: answer.id,
            question_id: answer.question_id,
            user_id: answer.user_id,
            author: None,
            content: answer.content,
            code_snippet: answer.code_snippet,
            language: answer.language,
            upvotes: answer.upvotes_count,
            downvotes: answer.downvotes_count,
            is_accepted: answer.is_accepted,
            user_vote: None,
            comments: None,
            created_at: answer.created_at.to_rfc3339(),
            updated_at: answer.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

impl From<AnswerView> for AnswerResponse {
    fn from(view: AnswerView) -> Self {
        let mut response = Self::from(view.answer);
        response.author = view.author.map(Into::into);
        response.user_vote = view.user_vote;
        response.comments = Some(view.comments.into_iter().map(Into::into).collect());
        response
    }
}

/// Body of a vote request. `voteType` is `"upvote"` or `"downvote"`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub vote_type: String,
}

impl VoteRequest {
    /// Parse into a direction; anything else is rejected before the engine sees it.
    pub fn direction(&self) -> AppResult<VoteDirection> {
        VoteDirection::from_vote_type(&self.vote_type).ok_or_else(|| {
            AppError::InvalidArgument(format!("Invalid vote type: {}", self.vote_type))
        })
    }
}

/// A voted target plus its author's new reputation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse<T: Serialize> {
    #[serde(flatten)]
    pub target: T,
    pub author_reputation: i32,
}

/// Acceptance result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    pub question_id: String,
    pub accepted_answer_id: String,
    pub revoked_answer_id: Option<String>,
    pub answer: AnswerResponse,
}

/// Post an answer.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateAnswerInput>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let answer = state.answer_service.create(&user.id, input).await?;

    let mut response = AnswerResponse::from(answer);
    response.author = Some(user.into());
    Ok(ApiResponse::created(response))
}

/// Edit an answer.
async fn update(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateAnswerInput>,
) -> AppResult<ApiResponse<AnswerResponse>> {
    let answer = state.answer_service.update(&user, &id, input).await?;
    Ok(ApiResponse::ok(answer.into()))
}

/// Soft delete an answer.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.answer_service.delete(&user, &id).await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Answer deleted successfully",
    )))
}

/// Upvote or downvote an answer.
async fn vote(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VoteRequest>,
) -> AppResult<ApiResponse<VoteResponse<AnswerResponse>>> {
    let direction = req.direction()?;
    let outcome = state
        .voting_service
        .cast_vote(TargetKind::Answer, &id, &user.id, direction)
        .await?;

    let VotedTarget::Answer(answer) = outcome.target else {
        return Err(AppError::Internal("Vote landed on a question".to_string()));
    };
    let mut target = AnswerResponse::from(answer);
    target.user_vote = Some(outcome.user_vote);

    Ok(ApiResponse::ok(VoteResponse {
        target,
        author_reputation: outcome.author_reputation,
    }))
}

/// Accept an answer to one's own question.
async fn accept(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<AcceptResponse>> {
    let outcome = state
        .voting_service
        .accept_answer_by_id(&id, &user.id)
        .await?;

    Ok(ApiResponse::ok(AcceptResponse {
        question_id: outcome.question.id,
        accepted_answer_id: outcome.answer.id.clone(),
        revoked_answer_id: outcome.revoked_answer_id,
        answer: outcome.answer.into(),
    }))
}

/// Comment on an answer.
async fn add_comment(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AddCommentInput>,
) -> AppResult<ApiResponse<CommentResponse>> {
    let comment = state.answer_service.add_comment(&user.id, &id, input).await?;
    Ok(ApiResponse::created(comment.into()))
}

/// List comments on an answer.
async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentResponse>>> {
    let comments = state.answer_service.list_comments(&id).await?;
    Ok(ApiResponse::ok(comments.into_iter().map(Into::into).collect()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}", put(update).delete(delete))
        .route("/{id}/vote", post(vote))
        .route("/{id}/accept", post(accept))
        .route("/{id}/comments", get(list_comments).post(add_comment))
}
