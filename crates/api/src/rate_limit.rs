//! API rate limiting middleware.
//!
//! Fixed-window counters kept in process memory, keyed by caller id when the
//! auth middleware has identified one and by client IP otherwise.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{HeaderValue, Method, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use quorum_common::AppError;
use quorum_db::entities::user;
use tokio::sync::RwLock;

/// Request budget for one class of endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl RateLimitRule {
    /// Create a new rule.
    #[must_use]
    pub const fn new(max_requests: u32, window_secs: u64) -> Self {
        Self {
            max_requests,
            window_secs,
        }
    }
}

/// Budgets per endpoint class.
pub mod limits {
    use super::RateLimitRule;

    /// Reads.
    pub const READ: RateLimitRule = RateLimitRule::new(300, 60);

    /// Content writes (questions, answers, comments).
    pub const WRITE: RateLimitRule = RateLimitRule::new(30, 60);

    /// Votes and acceptance.
    pub const VOTE: RateLimitRule = RateLimitRule::new(60, 60);

    /// Login and registration.
    pub const AUTH: RateLimitRule = RateLimitRule::new(10, 300);
}

#[derive(Debug, Clone)]
struct Window {
    count: u32,
    started: Instant,
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        limit: u32,
        /// Seconds until the window resets.
        reset: u64,
    },
    Limited {
        retry_after: u64,
        limit: u32,
    },
}

/// In-memory fixed-window limiter.
#[derive(Clone, Default)]
pub struct ApiRateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
}

impl ApiRateLimiter {
    /// Create an empty limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request against `key` and report whether it may proceed.
    pub async fn check(&self, key: &str, rule: RateLimitRule) -> RateLimitResult {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        let length = Duration::from_secs(rule.window_secs);

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            started: now,
        });

        if now.duration_since(window.started) >= length {
            window.count = 0;
            window.started = now;
        }

        let left = length
            .saturating_sub(now.duration_since(window.started))
            .as_secs();

        if window.count >= rule.max_requests {
            return RateLimitResult::Limited {
                retry_after: left.max(1),
                limit: rule.max_requests,
            };
        }

        window.count += 1;
        RateLimitResult::Allowed {
            remaining: rule.max_requests - window.count,
            limit: rule.max_requests,
            reset: left,
        }
    }

    /// Drop windows idle for longer than twice `max_window_secs`.
    pub async fn cleanup(&self, max_window_secs: u64) {
        let mut windows = self.windows.write().await;
        let now = Instant::now();
        let horizon = Duration::from_secs(max_window_secs.saturating_mul(2));

        windows.retain(|_, w| now.duration_since(w.started) < horizon);
    }

    /// Number of tracked keys.
    pub async fn key_count(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Limiter state shared by the middleware.
#[derive(Clone)]
pub struct RateLimiterState {
    pub limiter: ApiRateLimiter,
    pub enabled: bool,
}

impl RateLimiterState {
    /// Create limiter state; a disabled limiter lets everything through.
    #[must_use]
    pub fn new(enabled: bool) -> Self {
        Self {
            limiter: ApiRateLimiter::new(),
            enabled,
        }
    }
}

/// Pick the budget for a request from its method and path.
#[must_use]
pub fn rule_for(method: &Method, path: &str) -> RateLimitRule {
    if path.starts_with("/api/auth/login") || path.starts_with("/api/auth/register") {
        limits::AUTH
    } else if path.ends_with("/vote") || path.ends_with("/accept") {
        limits::VOTE
    } else if method == Method::GET {
        limits::READ
    } else {
        limits::WRITE
    }
}

fn client_ip(req: &Request<Body>) -> Option<IpAddr> {
    if let Some(ip) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse().ok())
    {
        return Some(ip);
    }

    req.headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Rate limiting middleware.
///
/// Must run after the auth middleware so signed-in callers get their own
/// budget instead of sharing one with their IP.
pub async fn rate_limit_middleware(
    State(state): State<RateLimiterState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.enabled {
        return next.run(req).await;
    }

    let rule = rule_for(req.method(), req.uri().path());
    let key = if let Some(user) = req.extensions().get::<user::Model>() {
        format!("user:{}:{}", user.id, rule.max_requests)
    } else if let Some(ip) = client_ip(&req) {
        format!("ip:{ip}:{}", rule.max_requests)
    } else {
        format!("unknown:{}", rule.max_requests)
    };

    match state.limiter.check(&key, rule).await {
        RateLimitResult::Allowed {
            remaining,
            limit,
            reset,
        } => {
            let mut response = next.run(req).await;
            let headers = response.headers_mut();
            headers.insert("X-RateLimit-Limit", HeaderValue::from(limit));
            headers.insert("X-RateLimit-Remaining", HeaderValue::from(remaining));
            headers.insert("X-RateLimit-Reset", HeaderValue::from(reset));
            response
        }
        RateLimitResult::Limited { retry_after, limit } => {
            tracing::debug!(key = %key, limit, retry_after, "Rate limited");
            let mut response = AppError::RateLimited.into_response();
            response
                .headers_mut()
                .insert("Retry-After", HeaderValue::from(retry_after));
            response
        }
    }
}
