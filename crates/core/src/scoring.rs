//! Reputation scoring model.
//!
//! Everything here is pure: no I/O, no clock. The voting service feeds it the
//! before/after state of one vote and persists what comes out, and the
//! reconciliation path feeds it whole-account tallies.

use std::collections::HashMap;

use quorum_common::config::ReputationConfig;
pub use quorum_db::entities::vote::{TargetKind, VoteDirection};

/// Reputation deltas applied to a content author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoringRules {
    pub question_upvote: i32,
    pub question_downvote: i32,
    pub answer_upvote: i32,
    pub answer_downvote: i32,
    pub answer_accepted: i32,
}

impl ScoringRules {
    /// +5 / -2 for questions, +10 / -2 for answers, +15 for acceptance.
    pub const CANONICAL: Self = Self {
        question_upvote: 5,
        question_downvote: -2,
        answer_upvote: 10,
        answer_downvote: -2,
        answer_accepted: 15,
    };

    /// Delta one vote contributes to its target's author.
    #[must_use]
    pub const fn vote_delta(&self, kind: TargetKind, direction: VoteDirection) -> i32 {
        match (kind, direction) {
            (TargetKind::Question, VoteDirection::Up) => self.question_upvote,
            (TargetKind::Question, VoteDirection::Down) => self.question_downvote,
            (TargetKind::Answer, VoteDirection::Up) => self.answer_upvote,
            (TargetKind::Answer, VoteDirection::Down) => self.answer_downvote,
        }
    }

    /// Delta for an answer becoming accepted.
    #[must_use]
    pub const fn accept_delta(&self) -> i32 {
        self.answer_accepted
    }

    /// Delta for an answer losing its accepted state.
    #[must_use]
    pub const fn revoke_delta(&self) -> i32 {
        -self.answer_accepted
    }

    /// Author delta for one voter's slot changing state.
    ///
    /// The old vote's contribution is reversed and the new one applied, so the
    /// result depends only on this slot and never on the author's other content.
    #[must_use]
    pub const fn transition_delta(&self, kind: TargetKind, transition: VoteTransition) -> i32 {
        let removed = match transition.before {
            Some(before) => self.vote_delta(kind, before),
            None => 0,
        };
        self.vote_delta(kind, transition.after) - removed
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self::CANONICAL
    }
}

impl From<&ReputationConfig> for ScoringRules {
    fn from(config: &ReputationConfig) -> Self {
        Self {
            question_upvote: config.question_upvote,
            question_downvote: config.question_downvote,
            answer_upvote: config.answer_upvote,
            answer_downvote: config.answer_downvote,
            answer_accepted: config.answer_accepted,
        }
    }
}

/// One voter's slot on one target, before and after a cast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoteTransition {
    pub before: Option<VoteDirection>,
    pub after: VoteDirection,
}

impl VoteTransition {
    /// Build a transition from the stored vote (if any) and the requested one.
    #[must_use]
    pub const fn new(before: Option<VoteDirection>, after: VoteDirection) -> Self {
        Self { before, after }
    }

    /// Repeating the same vote changes no counts.
    #[must_use]
    pub fn is_repeat(self) -> bool {
        self.before == Some(self.after)
    }

    /// Changes to the target's `(upvotes, downvotes)` counters.
    #[must_use]
    pub const fn count_deltas(self) -> (i32, i32) {
        let (mut up, mut down) = (0, 0);
        match self.before {
            Some(VoteDirection::Up) => up -= 1,
            Some(VoteDirection::Down) => down -= 1,
            None => {}
        }
        match self.after {
            VoteDirection::Up => up += 1,
            VoteDirection::Down => down += 1,
        }
        (up, down)
    }
}

/// Apply a delta to a stored reputation, flooring at zero.
#[must_use]
pub fn apply_delta(reputation: i32, delta: i32) -> i32 {
    reputation.saturating_add(delta).max(0)
}

/// The vote sets of a single target, keyed by voter.
///
/// A map rather than two lists, so a voter can hold at most one direction.
#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    votes: HashMap<String, VoteDirection>,
}

impl VoteLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `voter`'s vote and report how their slot changed.
    pub fn cast(&mut self, voter: &str, direction: VoteDirection) -> VoteTransition {
        let before = self.votes.insert(voter.to_string(), direction);
        VoteTransition::new(before, direction)
    }

    /// The voter's current vote.
    #[must_use]
    pub fn vote_of(&self, voter: &str) -> Option<VoteDirection> {
        self.votes.get(voter).copied()
    }

    /// Number of upvotes.
    #[must_use]
    pub fn upvotes(&self) -> usize {
        self.count(VoteDirection::Up)
    }

    /// Number of downvotes.
    #[must_use]
    pub fn downvotes(&self) -> usize {
        self.count(VoteDirection::Down)
    }

    /// Upvotes minus downvotes.
    #[must_use]
    pub fn score(&self) -> i64 {
        self.upvotes() as i64 - self.downvotes() as i64
    }

    fn count(&self, direction: VoteDirection) -> usize {
        self.votes.values().filter(|d| **d == direction).count()
    }
}

/// Everything that contributes to one user's reputation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReputationTally {
    pub question_upvotes: u64,
    pub question_downvotes: u64,
    pub answer_upvotes: u64,
    pub answer_downvotes: u64,
    pub accepted_answers: u64,
}

impl ReputationTally {
    /// Reputation as a pure function of the tally: the sum, floored at zero.
    ///
    /// Only the final sum is clamped. The incremental path clamps after each
    /// event, so the two can disagree when an author dipped below zero along
    /// the way; this value is the one reconciliation writes.
    #[must_use]
    pub fn reputation(&self, rules: &ScoringRules) -> i32 {
        let weighted = |count: u64, delta: i32| {
            i64::try_from(count)
                .unwrap_or(i64::MAX)
                .saturating_mul(i64::from(delta))
        };

        let sum = weighted(self.question_upvotes, rules.question_upvote)
            .saturating_add(weighted(self.question_downvotes, rules.question_downvote))
            .saturating_add(weighted(self.answer_upvotes, rules.answer_upvote))
            .saturating_add(weighted(self.answer_downvotes, rules.answer_downvote))
            .saturating_add(weighted(self.accepted_answers, rules.answer_accepted));

        i32::try_from(sum.max(0)).unwrap_or(i32::MAX)
    }
}
