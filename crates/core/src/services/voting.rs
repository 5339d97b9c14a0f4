//! Voting, acceptance and reputation service.
//!
//! Every write here runs in one transaction: the target row is locked first,
//! so concurrent voters on the same target serialize, and the author's
//! reputation moves by a single atomic `GREATEST(reputation + delta, 0)`.

use std::sync::Arc;

use quorum_common::{AppError, AppResult, IdGenerator};
use quorum_db::{
    entities::{answer, question, vote},
    repositories::{AnswerRepository, QuestionRepository, UserRepository, VoteRepository},
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, Set, TransactionTrait};

use crate::scoring::{ReputationTally, ScoringRules, TargetKind, VoteDirection, VoteTransition};

/// The content a vote landed on, with counters as of the commit.
#[derive(Debug, Clone)]
pub enum VotedTarget {
    Question(question::Model),
    Answer(answer::Model),
}

impl VotedTarget {
    /// Upvotes minus downvotes.
    #[must_use]
    pub const fn vote_score(&self) -> i32 {
        match self {
            Self::Question(q) => q.vote_score(),
            Self::Answer(a) => a.vote_score(),
        }
    }
}

/// Result of casting a vote.
#[derive(Debug, Clone)]
pub struct VoteOutcome {
    pub target: VotedTarget,
    /// The caller's vote after the cast.
    pub user_vote: VoteDirection,
    /// Reputation change applied to the target's author.
    pub reputation_delta: i32,
    /// The author's reputation after the change.
    pub author_reputation: i32,
}

/// Result of accepting an answer.
#[derive(Debug, Clone)]
pub struct AcceptOutcome {
    pub question: question::Model,
    pub answer: answer::Model,
    /// The answer that lost its accepted state, if any.
    pub revoked_answer_id: Option<String>,
    /// False when the answer was already the accepted one.
    pub changed: bool,
}

/// Voting service: votes, acceptance and reputation bookkeeping.
#[derive(Clone)]
pub struct VotingService {
    db: Arc<DatabaseConnection>,
    rules: ScoringRules,
    id_gen: IdGenerator,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>, rules: ScoringRules) -> Self {
        Self {
            db,
            rules,
            id_gen: IdGenerator::new(),
        }
    }

    /// The deltas this service applies.
    #[must_use]
    pub const fn rules(&self) -> &ScoringRules {
        &self.rules
    }

    /// Set `voter_id`'s vote on a question or answer.
    ///
    /// Repeating a vote only refreshes its timestamp; switching moves the
    /// voter and reverses the old vote's effect on the author.
    pub async fn cast_vote(
        &self,
        kind: TargetKind,
        target_id: &str,
        voter_id: &str,
        direction: VoteDirection,
    ) -> AppResult<VoteOutcome> {
        let txn = self.begin().await?;

        let mut target = lock_target(&txn, kind, target_id).await?;
        let author_id = match &target {
            VotedTarget::Question(q) => q.user_id.clone(),
            VotedTarget::Answer(a) => a.user_id.clone(),
        };

        if author_id == voter_id {
            let what = match kind {
                TargetKind::Question => "question",
                TargetKind::Answer => "answer",
            };
            return Err(AppError::Forbidden(format!(
                "Cannot vote on your own {what}"
            )));
        }

        let existing = VoteRepository::find_for_update(&txn, voter_id, kind, target_id).await?;
        let transition = VoteTransition::new(existing.as_ref().map(|v| v.direction), direction);

        match existing {
            Some(vote) => {
                VoteRepository::update_direction(&txn, &vote.id, direction).await?;
            }
            None => {
                let model = vote::ActiveModel {
                    id: Set(self.id_gen.generate()),
                    user_id: Set(voter_id.to_string()),
                    target_type: Set(kind),
                    target_id: Set(target_id.to_string()),
                    direction: Set(direction),
                    created_at: Set(chrono::Utc::now().into()),
                };
                VoteRepository::create(&txn, model).await?;
            }
        }

        let (up_delta, down_delta) = if transition.is_repeat() {
            (0, 0)
        } else {
            transition.count_deltas()
        };
        let reputation_delta = self.rules.transition_delta(kind, transition);

        match &mut target {
            VotedTarget::Question(q) => {
                QuestionRepository::adjust_vote_counts(&txn, &q.id, up_delta, down_delta).await?;
                q.upvotes_count += up_delta;
                q.downvotes_count += down_delta;
            }
            VotedTarget::Answer(a) => {
                AnswerRepository::adjust_vote_counts(&txn, &a.id, up_delta, down_delta).await?;
                a.upvotes_count += up_delta;
                a.downvotes_count += down_delta;
            }
        }

        UserRepository::add_reputation(&txn, &author_id, reputation_delta).await?;
        let author_reputation = UserRepository::reputation_of(&txn, &author_id).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            target_id = %target_id,
            kind = ?kind,
            voter_id = %voter_id,
            before = ?transition.before,
            after = ?transition.after,
            reputation_delta,
            "Vote cast"
        );

        Ok(VoteOutcome {
            target,
            user_vote: direction,
            reputation_delta,
            author_reputation,
        })
    }

    /// Mark `answer_id` as the accepted answer of `question_id`.
    ///
    /// Only the question author may accept. A previously accepted sibling is
    /// un-accepted first and its author loses the acceptance bonus.
    pub async fn accept_answer(
        &self,
        question_id: &str,
        answer_id: &str,
        requester_id: &str,
    ) -> AppResult<AcceptOutcome> {
        let txn = self.begin().await?;

        let mut question = QuestionRepository::find_for_update(&txn, question_id)
            .await?
            .filter(|q| !q.is_deleted)
            .ok_or_else(|| AppError::QuestionNotFound(question_id.to_string()))?;

        let mut answer = AnswerRepository::find_for_update(&txn, answer_id)
            .await?
            .filter(|a| !a.is_deleted && a.question_id == question.id)
            .ok_or_else(|| AppError::AnswerNotFound(answer_id.to_string()))?;

        if question.user_id != requester_id {
            return Err(AppError::Forbidden(
                "Only the question author can accept answers".to_string(),
            ));
        }

        if answer.is_accepted && question.accepted_answer_id.as_deref() == Some(answer_id) {
            txn.commit()
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;
            return Ok(AcceptOutcome {
                question,
                answer,
                revoked_answer_id: None,
                changed: false,
            });
        }

        let mut revoked_answer_id = None;
        let mut reputation_moves = Vec::with_capacity(2);
        if let Some(previous_id) = question.accepted_answer_id.clone() {
            if let Some(previous) = AnswerRepository::find_for_update(&txn, &previous_id).await? {
                AnswerRepository::set_accepted(&txn, &previous.id, false).await?;
                reputation_moves.push((previous.user_id, self.rules.revoke_delta()));
                revoked_answer_id = Some(previous.id);
            }
        }

        AnswerRepository::set_accepted(&txn, &answer.id, true).await?;
        QuestionRepository::set_accepted_answer(
            &txn,
            &question.id,
            Some(&answer.id),
            question.version,
        )
        .await?;
        reputation_moves.push((answer.user_id.clone(), self.rules.accept_delta()));

        for (user_id, delta) in in_lock_order(reputation_moves) {
            UserRepository::add_reputation(&txn, &user_id, delta).await?;
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        question.accepted_answer_id = Some(answer.id.clone());
        question.version += 1;
        answer.is_accepted = true;

        tracing::info!(
            question_id = %question.id,
            answer_id = %answer.id,
            revoked = ?revoked_answer_id,
            "Answer accepted"
        );

        Ok(AcceptOutcome {
            question,
            answer,
            revoked_answer_id,
            changed: true,
        })
    }

    /// Accept an answer, resolving its question from the answer itself.
    pub async fn accept_answer_by_id(
        &self,
        answer_id: &str,
        requester_id: &str,
    ) -> AppResult<AcceptOutcome> {
        let answer = AnswerRepository::new(self.db.clone())
            .get_visible(answer_id)
            .await?;
        self.accept_answer(&answer.question_id, answer_id, requester_id)
            .await
    }

    /// Recompute a user's reputation from scratch and store it.
    ///
    /// Votes on and acceptance of soft-deleted content still count.
    pub async fn recompute_reputation(&self, user_id: &str) -> AppResult<i32> {
        let txn = self.begin().await?;

        let stored = UserRepository::reputation_of(&txn, user_id).await?;

        let tally = ReputationTally {
            question_upvotes: VoteRepository::count_on_authored(
                &txn,
                user_id,
                TargetKind::Question,
                VoteDirection::Up,
            )
            .await?,
            question_downvotes: VoteRepository::count_on_authored(
                &txn,
                user_id,
                TargetKind::Question,
                VoteDirection::Down,
            )
            .await?,
            answer_upvotes: VoteRepository::count_on_authored(
                &txn,
                user_id,
                TargetKind::Answer,
                VoteDirection::Up,
            )
            .await?,
            answer_downvotes: VoteRepository::count_on_authored(
                &txn,
                user_id,
                TargetKind::Answer,
                VoteDirection::Down,
            )
            .await?,
            accepted_answers: AnswerRepository::count_accepted_by_author(&txn, user_id).await?,
        };

        let reputation = tally.reputation(&self.rules);
        UserRepository::set_reputation(&txn, user_id, reputation).await?;

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        if stored == reputation {
            tracing::debug!(user_id = %user_id, reputation, "Reputation already consistent");
        } else {
            tracing::warn!(
                user_id = %user_id,
                stored,
                recomputed = reputation,
                "Reputation repaired"
            );
        }

        Ok(reputation)
    }

    /// Rebuild one target's cached vote counters from the vote rows.
    pub async fn recount_votes(&self, kind: TargetKind, target_id: &str) -> AppResult<(i32, i32)> {
        let txn = self.begin().await?;

        match kind {
            TargetKind::Question => {
                QuestionRepository::find_for_update(&txn, target_id)
                    .await?
                    .ok_or_else(|| AppError::QuestionNotFound(target_id.to_string()))?;
            }
            TargetKind::Answer => {
                AnswerRepository::find_for_update(&txn, target_id)
                    .await?
                    .ok_or_else(|| AppError::AnswerNotFound(target_id.to_string()))?;
            }
        }

        let up = VoteRepository::count_for_target(&txn, kind, target_id, VoteDirection::Up).await?
            as i32;
        let down = VoteRepository::count_for_target(&txn, kind, target_id, VoteDirection::Down)
            .await? as i32;

        match kind {
            TargetKind::Question => {
                QuestionRepository::set_vote_counts(&txn, target_id, up, down).await?;
            }
            TargetKind::Answer => {
                AnswerRepository::set_vote_counts(&txn, target_id, up, down).await?;
            }
        }

        txn.commit()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((up, down))
    }

    async fn begin(&self) -> AppResult<DatabaseTransaction> {
        self.db
            .begin()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

/// Sort reputation changes by user id so concurrent transactions touching
/// the same pair of users take their row locks in the same order.
fn in_lock_order(mut moves: Vec<(String, i32)>) -> Vec<(String, i32)> {
    moves.sort_by(|a, b| a.0.cmp(&b.0));
    moves
}

async fn lock_target(
    txn: &DatabaseTransaction,
    kind: TargetKind,
    target_id: &str,
) -> AppResult<VotedTarget> {
    match kind {
        TargetKind::Question => QuestionRepository::find_for_update(txn, target_id)
            .await?
            .filter(|q| !q.is_deleted)
            .map(VotedTarget::Question)
            .ok_or_else(|| AppError::QuestionNotFound(target_id.to_string())),
        TargetKind::Answer => AnswerRepository::find_for_update(txn, target_id)
            .await?
            .filter(|a| !a.is_deleted)
            .map(VotedTarget::Answer)
            .ok_or_else(|| AppError::AnswerNotFound(target_id.to_string())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use quorum_db::entities::{question::Difficulty, user};
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Value};

    fn create_test_question(id: &str, user_id: &str) -> question::Model {
        question::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: "How do lifetimes work?".to_string(),
            content: "I keep fighting the borrow checker on this.".to_string(),
            tags: serde_json::json!([]),
            category: "rust".to_string(),
            difficulty: Difficulty::Beginner,
            code_snippet: String::new(),
            language: "text".to_string(),
            views: 0,
            answers_count: 1,
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

    fn create_test_answer(id: &str, question_id: &str, user_id: &str) -> answer::Model {
        answer::Model {
            id: id.to_string(),
            question_id: question_id.to_string(),
            user_id: user_id.to_string(),
            content: "Use an explicit lifetime parameter.".to_string(),
            code_snippet: String::new(),
            language: "rust".to_string(),
            upvotes_count: 0,
            downvotes_count: 0,
            is_accepted: false,
            is_deleted: false,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    fn create_test_vote(user_id: &str, target_id: &str, direction: VoteDirection) -> vote::Model {
        vote::Model {
            id: format!("v-{user_id}-{target_id}"),
            user_id: user_id.to_string(),
            target_type: TargetKind::Question,
            target_id: target_id.to_string(),
            direction,
            created_at: Utc::now().into(),
        }
    }

    fn create_test_user(id: &str, reputation: i32) -> user::Model {
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
            role: user::UserRole::User,
            reputation,
            is_active: true,
            last_seen_at: None,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    const fn exec(rows_affected: u64) -> MockExecResult {
        MockExecResult {
            last_insert_id: 0,
            rows_affected,
        }
    }

    fn executed_sql(db: Arc<DatabaseConnection>) -> Vec<String> {
        Arc::try_unwrap(db)
            .unwrap()
            .into_transaction_log()
            .iter()
            .flat_map(|txn| txn.statements().iter().map(|stmt| stmt.sql.clone()))
            .collect()
    }

    fn service_with(db: MockDatabase) -> VotingService {
        VotingService::new(Arc::new(db.into_connection()), ScoringRules::CANONICAL)
    }

    #[tokio::test]
    async fn test_cast_vote_on_own_question_is_forbidden() {
        let question = create_test_question("q1", "asker");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[question]]),
        );

        let result = service
            .cast_vote(TargetKind::Question, "q1", "asker", VoteDirection::Up)
            .await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_cast_vote_on_missing_answer() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<answer::Model>::new()]),
        );

        let result = service
            .cast_vote(TargetKind::Answer, "a404", "voter", VoteDirection::Up)
            .await;

        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }

    #[tokio::test]
    async fn test_cast_vote_on_deleted_question() {
        let mut question = create_test_question("q1", "asker");
        question.is_deleted = true;
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[question]]),
        );

        let result = service
            .cast_vote(TargetKind::Question, "q1", "voter", VoteDirection::Down)
            .await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }

    #[tokio::test]
    async fn test_first_upvote_on_question() {
        let question = create_test_question("q1", "asker");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question]])
                .append_query_results([Vec::<vote::Model>::new()])
                .append_query_results([[create_test_vote("voter", "q1", VoteDirection::Up)]])
                .append_exec_results([exec(1), exec(1)])
                .append_query_results([[create_test_user("asker", 5)]]),
        );

        let outcome = service
            .cast_vote(TargetKind::Question, "q1", "voter", VoteDirection::Up)
            .await
            .unwrap();

        assert_eq!(outcome.reputation_delta, 5);
        assert_eq!(outcome.author_reputation, 5);
        assert_eq!(outcome.user_vote, VoteDirection::Up);
        assert_eq!(outcome.target.vote_score(), 1);
    }

    #[tokio::test]
    async fn test_switching_vote_reverses_old_delta() {
        let mut question = create_test_question("q1", "asker");
        question.upvotes_count = 1;
        let existing = create_test_vote("voter", "q1", VoteDirection::Up);
        let mut switched = existing.clone();
        switched.direction = VoteDirection::Down;

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question]])
                .append_query_results([[existing]])
                .append_query_results([[switched]])
                .append_exec_results([exec(1), exec(1)])
                .append_query_results([[create_test_user("asker", 0)]]),
        );

        let outcome = service
            .cast_vote(TargetKind::Question, "q1", "voter", VoteDirection::Down)
            .await
            .unwrap();

        assert_eq!(outcome.reputation_delta, -7);
        assert_eq!(outcome.target.vote_score(), -1);
    }

    #[tokio::test]
    async fn test_repeated_vote_changes_nothing() {
        let mut answer = create_test_answer("a1", "q1", "answerer");
        answer.upvotes_count = 1;
        let existing = create_test_vote("voter", "a1", VoteDirection::Up);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[answer]])
            .append_query_results([[existing.clone()]])
            .append_query_results([[existing]])
            .append_query_results([[create_test_user("answerer", 10)]])
            .into_connection();
        let db = Arc::new(db);
        let service = VotingService::new(db.clone(), ScoringRules::CANONICAL);

        let outcome = service
            .cast_vote(TargetKind::Answer, "a1", "voter", VoteDirection::Up)
            .await
            .unwrap();

        assert_eq!(outcome.reputation_delta, 0);
        assert_eq!(outcome.author_reputation, 10);
        assert_eq!(outcome.target.vote_score(), 1);

        drop(service);
        let statements = executed_sql(db);
        assert!(statements.iter().any(|sql| sql.starts_with(r#"UPDATE "vote""#)));
        assert!(!statements.iter().any(|sql| sql.starts_with(r#"UPDATE "answer""#)));
        assert!(!statements.iter().any(|sql| sql.contains("GREATEST")));
    }

    #[tokio::test]
    async fn test_accept_by_non_author_is_forbidden() {
        let question = create_test_question("q1", "asker");
        let answer = create_test_answer("a1", "q1", "answerer");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question]])
                .append_query_results([[answer]]),
        );

        let result = service.accept_answer("q1", "a1", "answerer").await;

        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_accept_answer_of_other_question() {
        let question = create_test_question("q1", "asker");
        let answer = create_test_answer("a1", "q2", "answerer");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question]])
                .append_query_results([[answer]]),
        );

        let result = service.accept_answer("q1", "a1", "asker").await;

        assert!(matches!(result, Err(AppError::AnswerNotFound(_))));
    }

    #[tokio::test]
    async fn test_accept_already_accepted_is_noop() {
        let mut question = create_test_question("q1", "asker");
        question.accepted_answer_id = Some("a1".to_string());
        let mut answer = create_test_answer("a1", "q1", "answerer");
        answer.is_accepted = true;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[question]])
            .append_query_results([[answer]])
            .into_connection();
        let db = Arc::new(db);
        let service = VotingService::new(db.clone(), ScoringRules::CANONICAL);

        let outcome = service.accept_answer("q1", "a1", "asker").await.unwrap();
        assert!(!outcome.changed);

        drop(service);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(!log.contains("GREATEST"));
    }

    #[tokio::test]
    async fn test_accept_replaces_previous_answer() {
        let mut question = create_test_question("q1", "asker");
        question.accepted_answer_id = Some("a1".to_string());
        question.version = 3;
        let mut previous = create_test_answer("a1", "q1", "first");
        previous.is_accepted = true;
        let answer = create_test_answer("a2", "q1", "second");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[question]])
            .append_query_results([[answer]])
            .append_query_results([[previous]])
            .append_exec_results([exec(1), exec(1), exec(1), exec(1), exec(1)])
            .into_connection();
        let db = Arc::new(db);
        let service = VotingService::new(db.clone(), ScoringRules::CANONICAL);

        let outcome = service.accept_answer("q1", "a2", "asker").await.unwrap();

        assert!(outcome.changed);
        assert_eq!(outcome.revoked_answer_id.as_deref(), Some("a1"));
        assert_eq!(outcome.question.accepted_answer_id.as_deref(), Some("a2"));
        assert_eq!(outcome.question.version, 4);
        assert!(outcome.answer.is_accepted);

        drop(service);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        assert!(log.contains("Int(Some(-15))"));
        assert!(log.contains("Int(Some(15))"));
    }

    #[test]
    fn test_reputation_moves_sorted_by_user() {
        let moves = in_lock_order(vec![("zed".to_string(), -15), ("amy".to_string(), 15)]);
        assert_eq!(moves[0].0, "amy");
        assert_eq!(moves[1].0, "zed");
    }

    #[tokio::test]
    async fn test_accept_updates_authors_in_id_order() {
        let mut question = create_test_question("q1", "asker");
        question.accepted_answer_id = Some("a1".to_string());
        let mut previous = create_test_answer("a1", "q1", "zed");
        previous.is_accepted = true;
        let answer = create_test_answer("a2", "q1", "amy");

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[question]])
            .append_query_results([[answer]])
            .append_query_results([[previous]])
            .append_exec_results([exec(1), exec(1), exec(1), exec(1), exec(1)])
            .into_connection();
        let db = Arc::new(db);
        let service = VotingService::new(db.clone(), ScoringRules::CANONICAL);

        service.accept_answer("q1", "a2", "asker").await.unwrap();

        drop(service);
        let log = format!("{:?}", Arc::try_unwrap(db).unwrap().into_transaction_log());
        let grant = log.find("Int(Some(15))").unwrap();
        let revoke = log.find("Int(Some(-15))").unwrap();
        assert!(grant < revoke);
    }

    #[tokio::test]
    async fn test_accept_conflicts_on_stale_version() {
        let question = create_test_question("q1", "asker");
        let answer = create_test_answer("a1", "q1", "answerer");
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[question]])
                .append_query_results([[answer]])
                .append_exec_results([exec(1), exec(0)]),
        );

        let result = service.accept_answer("q1", "a1", "asker").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_recompute_reputation_clamps_final_sum() {
        let count = |n: i64| {
            vec![btreemap! {
                "num_items" => Into::<Value>::into(n),
            }]
        };

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_user("author", 40)]])
                .append_query_results([count(0)])
                .append_query_results([count(3)])
                .append_query_results([count(1)])
                .append_query_results([count(0)])
                .append_query_results([count(0)])
                .append_exec_results([exec(1)]),
        );

        // -6 + 10 = 4
        let reputation = service.recompute_reputation("author").await.unwrap();

        assert_eq!(reputation, 4);
    }

    #[tokio::test]
    async fn test_recount_votes_on_missing_question() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<question::Model>::new()]),
        );

        let result = service.recount_votes(TargetKind::Question, "q404").await;

        assert!(matches!(result, Err(AppError::QuestionNotFound(_))));
    }
}
