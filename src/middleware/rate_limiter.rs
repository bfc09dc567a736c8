//! Rate limiting middleware
//!
//! Implements a global fixed-ceiling sliding window: at most `limit` requests
//! are admitted in any trailing window (60 seconds in production). Bursts up
//! to the ceiling are allowed at any point of the window.
//!
//! The window is a single lock-protected sequence of acceptance instants.
//! The lock is held only for prune, check and append; no I/O happens under
//! it. Pruning is a linear scan, which is fine for ceilings in the hundreds.
//! Much larger ceilings would want per-second buckets instead.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::{error::AppError, routes::metrics::record_outcome, AppState};

/// Window length used by the proxy
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

/// Outcome of a single admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    /// Whether the request was admitted (and recorded)
    pub allowed: bool,
    /// Configured ceiling
    pub limit: u32,
    /// Admissions still available in the current window
    pub remaining: u32,
    /// Time until a slot frees up; zero when admitted
    pub retry_after: Duration,
}

impl RateDecision {
    /// Retry-After value in whole seconds, never less than one
    pub fn retry_after_secs(&self) -> u64 {
        let secs = self.retry_after.as_secs();
        if self.retry_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs.max(1)
        }
    }

    /// Rate limit headers for an admitted response
    pub fn headers(&self) -> Vec<(header::HeaderName, HeaderValue)> {
        vec![
            (
                header::HeaderName::from_static("x-ratelimit-limit"),
                HeaderValue::from(self.limit),
            ),
            (
                header::HeaderName::from_static("x-ratelimit-remaining"),
                HeaderValue::from(self.remaining),
            ),
        ]
    }
}

/// Sliding-window limiter shared by every request of one proxy instance
#[derive(Debug)]
pub struct SlidingWindowLimiter {
    limit: u32,
    window: Duration,
    accepted: Mutex<VecDeque<Instant>>,
}

impl SlidingWindowLimiter {
    /// Create a limiter admitting `limit` requests per `window`
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window,
            accepted: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a limiter with the standard one-minute window
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, DEFAULT_WINDOW)
    }

    /// Configured ceiling
    pub fn limit(&self) -> u32 {
        self.limit
    }

    /// Admit or reject a request arriving at `now`
    pub fn admit(&self, now: Instant) -> bool {
        self.check(now).allowed
    }

    /// Prune stale entries, then record `now` if the window has room
    pub fn check(&self, now: Instant) -> RateDecision {
        // A poisoned lock still guards a consistent deque of instants.
        let mut accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);

        let window = self.window;
        accepted.retain(|&at| now.saturating_duration_since(at) < window);

        let used = accepted.len();
        if used < self.limit as usize {
            accepted.push_back(now);
            return RateDecision {
                allowed: true,
                limit: self.limit,
                remaining: self.limit - (used as u32) - 1,
                retry_after: Duration::ZERO,
            };
        }

        let retry_after = accepted
            .iter()
            .min()
            .map(|&oldest| window.saturating_sub(now.saturating_duration_since(oldest)))
            .unwrap_or(window);

        RateDecision {
            allowed: false,
            limit: self.limit,
            remaining: 0,
            retry_after,
        }
    }

    /// Number of admissions currently inside the window
    pub fn in_window(&self, now: Instant) -> usize {
        let accepted = self.accepted.lock().unwrap_or_else(PoisonError::into_inner);
        accepted
            .iter()
            .filter(|&&at| now.saturating_duration_since(at) < self.window)
            .count()
    }
}

/// Rate limiting middleware
///
/// Runs after authentication. Returns 429 when the window is saturated and
/// adds rate limit headers to admitted responses.
pub async fn rate_limit_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let decision = state.limiter.check(Instant::now());

    if !decision.allowed {
        warn!(
            limit = decision.limit,
            retry_after_secs = decision.retry_after_secs(),
            "Rate limit exceeded"
        );
        let err = AppError::RateLimitExceeded {
            limit: decision.limit,
            retry_after_secs: decision.retry_after_secs(),
        };
        record_outcome(err.outcome());
        return Err(err);
    }

    let mut response = next.run(request).await;

    let headers = response.headers_mut();
    for (name, value) in decision.headers() {
        headers.insert(name, value);
    }

    Ok(response)
}
