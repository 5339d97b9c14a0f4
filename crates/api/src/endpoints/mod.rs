//! API endpoints.

mod admin;
mod answers;
mod auth;
mod questions;
mod users;

use axum::{Json, Router, routing::get};
use serde_json::{Value, json};

use crate::middleware::AppState;

/// Create the API router: `/health` plus everything under `/api`.
pub fn router() -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/questions", questions::router())
        .nest("/answers", answers::router())
        .nest("/admin", admin::router());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
}

/// Liveness probe.
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
