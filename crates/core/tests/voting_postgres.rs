//! Voting engine against a live database.
//!
//! These tests require a running `PostgreSQL` instance.
//! Run with: `cargo test -p quorum-core --test voting_postgres -- --ignored`
//!
//! Connection settings come from the `TEST_DB_*` variables, see
//! `quorum_db::test_utils::TestDbConfig`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::Utc;
use quorum_common::{AppError, IdGenerator};
use quorum_core::{
    ScoringRules, VotingService,
    scoring::{TargetKind, VoteDirection},
};
use quorum_db::{
    entities::{Answer, Question, User, answer, question, user},
    test_utils::TestDatabase,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

async fn connect() -> Arc<DatabaseConnection> {
    let db = TestDatabase::new().await.expect("Failed to connect");
    db.migrate().await.expect("Migrations failed");
    Arc::new(db.conn)
}

async fn insert_user(conn: &DatabaseConnection, name: &str) -> user::Model {
    let id = IdGenerator::new().generate();
    let username = format!("{name}_{}", &id[20..]);
    user::ActiveModel {
        id: Set(id),
        username_lower: Set(username.to_lowercase()),
        email: Set(format!("{}@example.com", username.to_lowercase())),
        username: Set(username),
        password_hash: Set("x".to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        role: Set(user::UserRole::User),
        reputation: Set(0),
        is_active: Set(true),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

async fn insert_question(conn: &DatabaseConnection, author: &user::Model) -> question::Model {
    question::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        user_id: Set(author.id.clone()),
        title: Set("How do I share state across tasks?".to_string()),
        content: Set("Several tokio tasks need to read one config value.".to_string()),
        tags: Set(serde_json::json!(["tokio"])),
        category: Set("rust".to_string()),
        difficulty: Set(question::Difficulty::Intermediate),
        code_snippet: Set(String::new()),
        language: Set("rust".to_string()),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

async fn insert_answer(
    conn: &DatabaseConnection,
    question: &question::Model,
    author: &user::Model,
) -> answer::Model {
    answer::ActiveModel {
        id: Set(IdGenerator::new().generate()),
        question_id: Set(question.id.clone()),
        user_id: Set(author.id.clone()),
        content: Set("Wrap it in an Arc and clone the handle.".to_string()),
        code_snippet: Set(String::new()),
        language: Set("rust".to_string()),
        upvotes_count: Set(0),
        downvotes_count: Set(0),
        is_accepted: Set(false),
        is_deleted: Set(false),
        created_at: Set(Utc::now().into()),
        ..Default::default()
    }
    .insert(conn)
    .await
    .unwrap()
}

async fn reputation(conn: &DatabaseConnection, user: &user::Model) -> i32 {
    User::find_by_id(user.id.clone())
        .one(conn)
        .await
        .unwrap()
        .unwrap()
        .reputation
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_ask_answer_vote_accept_switch() {
    let conn = connect().await;
    let service = VotingService::new(conn.clone(), ScoringRules::CANONICAL);

    let bob = insert_user(&conn, "bob").await;
    let carol = insert_user(&conn, "carol").await;
    let dave = insert_user(&conn, "dave").await;
    let q = insert_question(&conn, &bob).await;
    let a = insert_answer(&conn, &q, &carol).await;

    let own = service
        .cast_vote(TargetKind::Question, &q.id, &bob.id, VoteDirection::Up)
        .await;
    assert!(matches!(own, Err(AppError::Forbidden(_))));

    let outcome = service
        .cast_vote(TargetKind::Question, &q.id, &dave.id, VoteDirection::Up)
        .await
        .unwrap();
    assert_eq!(outcome.author_reputation, 5);

    // Repeating the same vote is a no-op
    let repeat = service
        .cast_vote(TargetKind::Question, &q.id, &dave.id, VoteDirection::Up)
        .await
        .unwrap();
    assert_eq!(repeat.reputation_delta, 0);
    assert_eq!(repeat.target.vote_score(), 1);
    assert_eq!(reputation(&conn, &bob).await, 5);

    service
        .cast_vote(TargetKind::Answer, &a.id, &dave.id, VoteDirection::Up)
        .await
        .unwrap();
    assert_eq!(reputation(&conn, &carol).await, 10);

    let accepted = service.accept_answer(&q.id, &a.id, &bob.id).await.unwrap();
    assert!(accepted.changed);
    assert_eq!(reputation(&conn, &carol).await, 25);

    service
        .cast_vote(TargetKind::Question, &q.id, &dave.id, VoteDirection::Down)
        .await
        .unwrap();

    let stored_q = Question::find_by_id(q.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_q.upvotes_count, 0);
    assert_eq!(stored_q.downvotes_count, 1);
    assert_eq!(stored_q.accepted_answer_id.as_deref(), Some(a.id.as_str()));

    let stored_a = Answer::find_by_id(a.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored_a.upvotes_count, 1);
    assert!(stored_a.is_accepted);

    // 5 - 5 - 2 floors at zero
    assert_eq!(reputation(&conn, &bob).await, 0);
    assert_eq!(reputation(&conn, &carol).await, 25);

    assert_eq!(service.recompute_reputation(&bob.id).await.unwrap(), 0);
    assert_eq!(service.recompute_reputation(&carol.id).await.unwrap(), 25);
}

#[tokio::test]
#[ignore = "requires running PostgreSQL instance"]
async fn test_accepting_sibling_moves_bonus() {
    let conn = connect().await;
    let service = VotingService::new(conn.clone(), ScoringRules::CANONICAL);

    let bob = insert_user(&conn, "bob").await;
    let carol = insert_user(&conn, "carol").await;
    let erin = insert_user(&conn, "erin").await;
    let q = insert_question(&conn, &bob).await;
    let first = insert_answer(&conn, &q, &carol).await;
    let second = insert_answer(&conn, &q, &erin).await;

    service
        .accept_answer(&q.id, &first.id, &bob.id)
        .await
        .unwrap();
    let again = service
        .accept_answer(&q.id, &first.id, &bob.id)
        .await
        .unwrap();
    assert!(!again.changed);
    assert_eq!(reputation(&conn, &carol).await, 15);

    let moved = service
        .accept_answer_by_id(&second.id, &bob.id)
        .await
        .unwrap();
    assert_eq!(moved.revoked_answer_id.as_deref(), Some(first.id.as_str()));

    assert_eq!(reputation(&conn, &carol).await, 0);
    assert_eq!(reputation(&conn, &erin).await, 15);

    let stored_first = Answer::find_by_id(first.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert!(!stored_first.is_accepted);

    let stored_q = Question::find_by_id(q.id.clone())
        .one(conn.as_ref())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        stored_q.accepted_answer_id.as_deref(),
        Some(second.id.as_str())
    );

    let outsider = service.accept_answer(&q.id, &second.id, &erin.id).await;
    assert!(matches!(outsider, Err(AppError::Forbidden(_))));
}
