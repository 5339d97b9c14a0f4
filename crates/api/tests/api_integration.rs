//! API integration tests.
//!
//! These tests drive the full router (auth middleware included) against a
//! mock database.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::redundant_clone)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
};
use chrono::Utc;
use quorum_api::{AppState, RateLimiterState, auth_middleware, rate_limit_middleware, router};
use quorum_common::{
    TokenIssuer,
    config::{
        AuthConfig, Config, DatabaseConfig, RateLimitConfig, ReputationConfig, ServerConfig,
    },
};
use quorum_db::entities::{
    question::{self, Difficulty},
    user::{self, UserRole},
};
use sea_orm::{DatabaseBackend, MockDatabase};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "integration-secret";

/// Create a test configuration.
fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3000,
            url: "http://localhost:3000".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/test".to_string(),
            max_connections: 10,
            min_connections: 1,
        },
        auth: AuthConfig {
            jwt_secret: SECRET.to_string(),
            token_ttl_days: 7,
        },
        reputation: ReputationConfig::default(),
        rate_limit: RateLimitConfig { enabled: true },
    }
}

fn create_test_user(id: &str, role: UserRole) -> user::Model {
    user::Model {
        id: id.to_string(),
        username: id.to_string(),
        username_lower: id.to_string(),
        email: format!("{id}@example.com"),
        password_hash: String::new(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        bio: None,
        avatar_url: None,
        role,
        reputation: 0,
        is_active: true,
        last_seen_at: None,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

fn create_test_question(id: &str, user_id: &str) -> question::Model {
    question::Model {
        id: id.to_string(),
        user_id: user_id.to_string(),
        title: "How do lifetimes work?".to_string(),
        content: "I keep fighting the borrow checker on this.".to_string(),
        tags: serde_json::json!(["rust"]),
        category: "rust".to_string(),
        difficulty: Difficulty::Beginner,
        code_snippet: String::new(),
        language: "text".to_string(),
        views: 0,
        answers_count: 0,
        upvotes_count: 0,
        downvotes_count: 0,
        accepted_answer_id: None,
        is_closed: false,
        closed_by: None,
        closed_reason: None,
        is_deleted: false,
        version: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

/// Create the test router over the given mock database.
fn create_test_router(db: MockDatabase) -> Router {
    let state = AppState::new(Arc::new(db.into_connection()), &create_test_config());
    router()
        .layer(from_fn_with_state(
            RateLimiterState::new(true),
            rate_limit_middleware,
        ))
        .layer(from_fn_with_state(state.clone(), auth_middleware))
        .with_state(state)
}

fn empty_db() -> MockDatabase {
    MockDatabase::new(DatabaseBackend::Postgres)
}

fn bearer(user_id: &str) -> String {
    let token = TokenIssuer::new(SECRET, 7).issue(user_id).unwrap();
    format!("Bearer {token}")
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_endpoint_returns_404() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/nonexistent")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_me_requires_token() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_me_with_token() {
    let app = create_test_router(
        empty_db().append_query_results([[create_test_user("alice", UserRole::User)]]),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/me")
                .header("Authorization", bearer("alice"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("X-RateLimit-Limit"));
    let body = body_json(response).await;
    assert_eq!(body["data"]["id"], "alice");
    assert_eq!(body["data"]["email"], "alice@example.com");
    assert!(body["data"].get("passwordHash").is_none());
}

#[tokio::test]
async fn test_register_rejects_bad_username() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/auth/register")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    r#"{"username":"bad name!","email":"a@example.com","password":"hunter22","firstName":"A","lastName":"B"}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_vote_requires_auth() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/questions/q1/vote")
                .method("POST")
                .header("Content-Type", "application/json")
                .body(Body::from(r#"{"voteType":"upvote"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_vote_with_unknown_type_is_invalid_argument() {
    let app = create_test_router(
        empty_db().append_query_results([[create_test_user("dave", UserRole::User)]]),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/answers/a1/vote")
                .method("POST")
                .header("Content-Type", "application/json")
                .header("Authorization", bearer("dave"))
                .body(Body::from(r#"{"voteType":"sideways"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "INVALID_ARGUMENT");
}

#[tokio::test]
async fn test_self_vote_is_forbidden() {
    let app = create_test_router(
        empty_db()
            .append_query_results([[create_test_user("bob", UserRole::User)]])
            .append_query_results([[create_test_question("q1", "bob")]]),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/questions/q1/vote")
                .method("POST")
                .header("Content-Type", "application/json")
                .header("Authorization", bearer("bob"))
                .body(Body::from(r#"{"voteType":"upvote"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_search_without_query() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/questions/search")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_rejects_oversized_limit() {
    let app = create_test_router(empty_db());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/questions?limit=500")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_recompute_requires_admin() {
    let app = create_test_router(
        empty_db().append_query_results([[create_test_user("mod", UserRole::Moderator)]]),
    );

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/admin/reputation/recompute")
                .method("POST")
                .header("Content-Type", "application/json")
                .header("Authorization", bearer("mod"))
                .body(Body::from(r#"{"userId":"bob"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = create_test_router(empty_db());

    let login = || {
        Request::builder()
            .uri("/api/auth/login")
            .method("POST")
            .header("Content-Type", "application/json")
            .header("X-Forwarded-For", "203.0.113.9")
            .body(Body::from(r#"{"email":"not-an-email","password":"x"}"#))
            .unwrap()
    };

    for _ in 0..10 {
        let response = app.clone().oneshot(login()).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    let response = app.clone().oneshot(login()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("Retry-After"));
}
