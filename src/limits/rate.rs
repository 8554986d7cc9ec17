//! Sliding-window request rate limiting per caller.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::SecurityLimits;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request was accepted and counted against the window.
    Allowed,
    /// The caller is over the limit; retry once `retry_after` has elapsed.
    Limited {
        /// Time until the oldest counted request leaves the window,
        /// rounded up to whole seconds.
        retry_after: Duration,
    },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Limited { retry_after } => Some(*retry_after),
            Self::Allowed => None,
        }
    }
}

/// Per-caller sliding-window rate limiter.
///
/// Each caller's accepted-request timestamps are kept in an ordered log that
/// is pruned lazily on every check to the trailing window. A check is a
/// single prune-check-append critical section under the caller's map entry,
/// so concurrent callers never race on one log.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    period: TimeDelta,
    history: DashMap<String, Vec<DateTime<Utc>>>,
}

impl RateLimiter {
    pub fn new(limits: &SecurityLimits) -> Self {
        Self {
            max_requests: limits.max_requests_per_period,
            period: TimeDelta::from_std(limits.rate_limit_period).unwrap_or(TimeDelta::MAX),
            history: DashMap::new(),
        }
    }

    /// Check whether `caller` may make a request now, counting it if so.
    pub fn check(&self, caller: &str) -> RateDecision {
        self.check_at(caller, Utc::now())
    }

    /// Check at an explicit instant. An unknown caller starts with an empty
    /// log and is always accepted.
    pub fn check_at(&self, caller: &str, now: DateTime<Utc>) -> RateDecision {
        let mut log = self.history.entry(caller.to_string()).or_default();

        let before = log.len();
        log.retain(|t| now - *t < self.period);
        if log.len() < before {
            debug!(
                caller,
                pruned = before - log.len(),
                remaining = log.len(),
                "pruned expired rate-limit entries"
            );
        }

        if log.len() >= self.max_requests {
            // Oldest remaining entry bounds how long the caller must wait;
            // the log is not mutated on denial.
            let retry_after = log
                .first()
                .map(|oldest| round_up_secs(self.period - (now - *oldest)))
                .unwrap_or_default();
            warn!(caller, ?retry_after, "rate limit exceeded");
            return RateDecision::Limited { retry_after };
        }

        log.push(now);
        RateDecision::Allowed
    }

    /// Requests counted for `caller` inside the current window.
    pub fn recent_count(&self, caller: &str) -> usize {
        self.recent_count_at(caller, Utc::now())
    }

    pub fn recent_count_at(&self, caller: &str, now: DateTime<Utc>) -> usize {
        self.history
            .get(caller)
            .map(|log| log.iter().filter(|t| now - **t < self.period).count())
            .unwrap_or(0)
    }

    /// Clear every caller's log unconditionally.
    pub fn reset(&self) {
        self.history.clear();
        debug!("rate limiter reset");
    }
}

fn round_up_secs(delta: TimeDelta) -> Duration {
    let ms = delta.num_milliseconds().max(0) as u64;
    Duration::from_secs(ms.div_ceil(1000))
}
