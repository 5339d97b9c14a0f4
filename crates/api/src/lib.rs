//! HTTP API layer for quorum.
//!
//! - **Endpoints**: accounts, questions, answers, votes and admin repair
//! - **Extractors**: authenticated and optional callers
//! - **Middleware**: bearer-token auth, rate limiting
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod rate_limit;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
pub use rate_limit::{ApiRateLimiter, RateLimitRule, RateLimiterState, rate_limit_middleware};
