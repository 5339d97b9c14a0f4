//! Users endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use quorum_common::AppResult;
use quorum_db::entities::user::{self, UserRole};
use serde::Serialize;

use crate::{middleware::AppState, response::ApiResponse};

/// Public profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub reputation: i32,
    pub created_at: String,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            bio: user.bio,
            avatar_url: user.avatar_url,
            role: user.role,
            reputation: user.reputation,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// The caller's own profile: the public one plus private fields.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    #[serde(flatten)]
    pub profile: UserResponse,
    pub email: String,
    pub last_seen_at: Option<String>,
}

impl From<user::Model> for MeResponse {
    fn from(user: user::Model) -> Self {
        let email = user.email.clone();
        let last_seen_at = user.last_seen_at.map(|t| t.to_rfc3339());
        Self {
            profile: user.into(),
            email,
            last_seen_at,
        }
    }
}

/// Compact author card embedded in questions, answers and comments.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorResponse {
    pub id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub avatar_url: Option<String>,
    pub reputation: i32,
}

impl From<user::Model> for AuthorResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            avatar_url: user.avatar_url,
            reputation: user.reputation,
        }
    }
}

/// Show a user's public profile.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/{id}", get(show))
}
