//! Admin endpoints.

use axum::{Json, Router, extract::State, routing::post};
use quorum_common::AppResult;
use quorum_db::entities::vote::TargetKind;
use serde::{Deserialize, Serialize};

use crate::{extractors::AdminUser, middleware::AppState, response::ApiResponse};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecomputeResponse {
    pub user_id: String,
    pub reputation: i32,
}

/// Rebuild a user's reputation from their content's votes and acceptances.
async fn recompute_reputation(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<RecomputeRequest>,
) -> AppResult<ApiResponse<RecomputeResponse>> {
    let reputation = state
        .voting_service
        .recompute_reputation(&req.user_id)
        .await?;

    tracing::info!(admin_id = %admin.id, user_id = %req.user_id, reputation, "Reputation recomputed");

    Ok(ApiResponse::ok(RecomputeResponse {
        user_id: req.user_id,
        reputation,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecountRequest {
    pub target_type: TargetKind,
    pub target_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecountResponse {
    pub target_id: String,
    pub upvotes: i32,
    pub downvotes: i32,
    pub vote_score: i32,
}

/// Rebuild a question's or answer's cached vote counters.
async fn recount_votes(
    AdminUser(_): AdminUser,
    State(state): State<AppState>,
    Json(req): Json<RecountRequest>,
) -> AppResult<ApiResponse<RecountResponse>> {
    let (upvotes, downvotes) = state
        .voting_service
        .recount_votes(req.target_type, &req.target_id)
        .await?;

    Ok(ApiResponse::ok(RecountResponse {
        target_id: req.target_id,
        upvotes,
        downvotes,
        vote_score: upvotes - downvotes,
    }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reputation/recompute", post(recompute_reputation))
        .route("/votes/recount", post(recount_votes))
}
