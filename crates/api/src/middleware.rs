//! API middleware.

use std::sync::Arc;

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use quorum_common::{Config, TokenIssuer};
use quorum_core::{AnswerService, QuestionService, ScoringRules, UserService, VotingService};
use quorum_db::repositories::{
    AnswerCommentRepository, AnswerRepository, QuestionRepository, UserRepository,
    VoteRepository,
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub question_service: QuestionService,
    pub answer_service: AnswerService,
    pub voting_service: VotingService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));
        let question_repo = QuestionRepository::new(Arc::clone(&db));
        let answer_repo = AnswerRepository::new(Arc::clone(&db));
        let comment_repo = AnswerCommentRepository::new(Arc::clone(&db));
        let vote_repo = VoteRepository::new(Arc::clone(&db));

        let user_service =
            UserService::new(user_repo.clone(), TokenIssuer::from_config(&config.auth));
        let question_service = QuestionService::new(
            question_repo.clone(),
            answer_repo.clone(),
            comment_repo.clone(),
            user_repo,
            vote_repo,
        );
        let answer_service = AnswerService::new(answer_repo, question_repo, comment_repo);
        let voting_service = VotingService::new(db, ScoringRules::from(&config.reputation));

        Self {
            user_service,
            question_service,
            answer_service,
            voting_service,
        }
    }
}

/// Authentication middleware.
///
/// A valid bearer token puts the caller's user row into the request
/// extensions. Missing or invalid tokens are not rejected here; handlers that
/// need a caller ask for [`crate::extractors::AuthUser`].
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        match state.user_service.authenticate(token.trim()).await {
            Ok(user) => {
                req.extensions_mut().insert(user);
            }
            Err(e) => tracing::debug!(error = %e, "Ignoring bearer token"),
        }
    }

    next.run(req).await
}
