//! Database repositories.
//!
//! Each repository owns an `Arc<DatabaseConnection>` for ordinary reads and
//! writes. Steps that must run inside a caller's transaction are associated
//! functions generic over [`sea_orm::ConnectionTrait`], so the same query
//! serves both a pooled connection and a `DatabaseTransaction`.

pub mod answer;
pub mod answer_comment;
pub mod question;
pub mod user;
pub mod vote;

pub use answer::AnswerRepository;
pub use answer_comment::AnswerCommentRepository;
pub use question::{QuestionQuery, QuestionRepository, QuestionSort};
pub use user::UserRepository;
pub use vote::VoteRepository;

use quorum_common::AppError;
use sea_orm::{DbErr, SqlErr};

/// Map an insert/update error, turning unique-key violations into `Conflict`.
pub(crate) fn map_write_err(err: DbErr, what: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => {
            tracing::debug!(detail = %detail, what, "Unique key violation");
            AppError::Conflict(format!("{what} already exists"))
        }
        _ => AppError::Database(err.to_string()),
    }
}
