//! Core business logic for quorum.
//!
//! [`scoring`] holds the pure reputation model. [`services`] wraps it and the
//! repositories into the operations the API exposes.

pub mod scoring;
pub mod services;

pub use scoring::{ScoringRules, VoteLedger, VoteTransition};
pub use services::*;
