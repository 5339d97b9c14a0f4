//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use quorum_common::AppResult;
use quorum_core::{
    AuthSession, ChangePasswordInput, LoginInput, RegisterInput, UpdateProfileInput,
};
use serde::Serialize;

use super::users::MeResponse;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, MessageResponse},
};

/// A signed-in session.
#[derive(Serialize)]
pub struct SessionResponse {
    pub user: MeResponse,
    pub token: String,
}

impl From<AuthSession> for SessionResponse {
    fn from(session: AuthSession) -> Self {
        Self {
            user: session.user.into(),
            token: session.token,
        }
    }
}

/// Create an account.
async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.user_service.register(input).await?;
    Ok(ApiResponse::created(session.into()))
}

/// Sign in with email and password.
async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<ApiResponse<SessionResponse>> {
    let session = state.user_service.login(input).await?;
    Ok(ApiResponse::ok(session.into()))
}

/// Get current user.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<MeResponse> {
    ApiResponse::ok(user.into())
}

/// Update the caller's profile.
async fn update_profile(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<MeResponse>> {
    let user = state.user_service.update_profile(&user.id, input).await?;
    Ok(ApiResponse::ok(user.into()))
}

/// Change the caller's password.
async fn change_password(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<ChangePasswordInput>,
) -> AppResult<ApiResponse<MessageResponse>> {
    state.user_service.change_password(&user.id, input).await?;
    Ok(ApiResponse::ok(MessageResponse::new(
        "Password changed successfully",
    )))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/profile", put(update_profile))
        .route("/change-password", put(change_password))
}
