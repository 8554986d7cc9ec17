//! Guard layer: per-caller request rate limiting and daily cost budgeting.

mod budget;
mod rate;

pub use budget::{CostTracker, UsageSnapshot};
pub use rate::{RateDecision, RateLimiter};
