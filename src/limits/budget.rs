//! Daily cost budget accounting for upstream completion calls.

use std::sync::Mutex;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SecurityLimits;
use crate::{Error, Result};

/// Accounting readout produced after every tracked operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UsageSnapshot {
    /// Tokens metered for the most recent call.
    pub tokens: u32,
    /// Cost of the most recent call.
    pub request_cost: Decimal,
    /// Accumulated cost since the last rollover or reset.
    pub total_cost: Decimal,
    /// Requests recorded since the last rollover or reset.
    pub request_count: u64,
    /// Configured daily ceiling.
    pub max_cost: Decimal,
}

impl UsageSnapshot {
    /// Fraction of the daily budget consumed, clamped to `0.0..=1.0`.
    /// For display scaling only; accounting stays in [`Decimal`].
    pub fn utilization(&self) -> f64 {
        if self.max_cost <= Decimal::ZERO {
            return 0.0;
        }
        (self.total_cost / self.max_cost)
            .to_f64()
            .unwrap_or(1.0)
            .clamp(0.0, 1.0)
    }
}

#[derive(Debug)]
struct BudgetState {
    total_cost: Decimal,
    request_count: u64,
    reset_date: NaiveDate,
}

impl BudgetState {
    fn zeroed(today: NaiveDate) -> Self {
        Self {
            total_cost: Decimal::ZERO,
            request_count: 0,
            reset_date: today,
        }
    }

    /// Lazy daily rollover: runs only when an entry point is hit, so a
    /// session idle across a date boundary keeps the stale `reset_date`
    /// until its next call. That is the documented behavior, not a bug.
    fn roll_over(&mut self, today: NaiveDate) {
        if today > self.reset_date {
            warn!(
                previous_date = %self.reset_date,
                carried_cost = %self.total_cost,
                "daily budget rollover"
            );
            *self = Self::zeroed(today);
        }
    }
}

/// Process-wide daily spend tracker.
///
/// All monetary arithmetic is exact [`Decimal`]; the limit comparison is
/// inclusive (`total >= max` rejects). State mutations happen inside one
/// mutex-guarded critical section per entry point, covering the
/// rollover-check-accumulate sequence.
#[derive(Debug)]
pub struct CostTracker {
    max_cost: Decimal,
    state: Mutex<BudgetState>,
}

impl CostTracker {
    pub fn new(limits: &SecurityLimits) -> Self {
        Self::starting_on(limits, today())
    }

    /// Start accounting on an explicit date instead of today. The date-taking
    /// entry points (`check_budget_on`, `record_on`) pair with this for
    /// deterministic clocks.
    pub fn starting_on(limits: &SecurityLimits, date: NaiveDate) -> Self {
        Self {
            max_cost: limits.max_daily_cost,
            state: Mutex::new(BudgetState::zeroed(date)),
        }
    }

    /// Reject the next request if today's accumulated cost has reached the
    /// ceiling. Rollover runs first, so the day's first call after a date
    /// change always sees a zeroed total.
    pub fn check_budget(&self) -> Result<()> {
        self.check_budget_on(today())
    }

    pub fn check_budget_on(&self, date: NaiveDate) -> Result<()> {
        let mut state = self.lock();
        state.roll_over(date);
        if state.total_cost >= self.max_cost {
            warn!(total = %state.total_cost, limit = %self.max_cost, "daily cost limit reached");
            return Err(Error::BudgetExceeded {
                limit: self.max_cost,
                used: state.total_cost,
            });
        }
        Ok(())
    }

    /// Fold one successful upstream call into the running totals.
    pub fn record(&self, cost: Decimal, tokens: u32) -> UsageSnapshot {
        self.record_on(cost, tokens, today())
    }

    pub fn record_on(&self, cost: Decimal, tokens: u32, date: NaiveDate) -> UsageSnapshot {
        let mut state = self.lock();
        state.roll_over(date);
        state.total_cost += cost;
        state.request_count += 1;
        info!(
            request_cost = %cost,
            total_cost = %state.total_cost,
            request_count = state.request_count,
            "recorded upstream usage"
        );
        self.snapshot_of(&state, cost, tokens)
    }

    /// Current totals without recording anything.
    pub fn snapshot(&self) -> UsageSnapshot {
        self.snapshot_on(today())
    }

    pub fn snapshot_on(&self, date: NaiveDate) -> UsageSnapshot {
        let mut state = self.lock();
        state.roll_over(date);
        self.snapshot_of(&state, Decimal::ZERO, 0)
    }

    /// Zero the totals and restart today's accounting.
    pub fn reset(&self) -> UsageSnapshot {
        let mut state = self.lock();
        *state = BudgetState::zeroed(today());
        self.snapshot_of(&state, Decimal::ZERO, 0)
    }

    fn snapshot_of(&self, state: &BudgetState, request_cost: Decimal, tokens: u32) -> UsageSnapshot {
        UsageSnapshot {
            tokens,
            request_cost,
            total_cost: state.total_cost,
            request_count: state.request_count,
            max_cost: self.max_cost,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BudgetState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn day(n: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, n).unwrap()
    }

    fn tracker(max: Decimal) -> CostTracker {
        let limits = SecurityLimits {
            max_daily_cost: max,
            ..Default::default()
        };
        CostTracker::starting_on(&limits, day(1))
    }

    #[test]
    fn test_budget_rejects_inclusively() {
        let tracker = tracker(dec!(0.10));
        assert!(tracker.check_budget_on(day(1)).is_ok());
        tracker.record_on(dec!(0.04), 100, day(1));
        assert!(tracker.check_budget_on(day(1)).is_ok());
        tracker.record_on(dec!(0.04), 100, day(1));
        assert!(tracker.check_budget_on(day(1)).is_ok());
        tracker.record_on(dec!(0.04), 100, day(1));
        // 0.12 >= 0.10: rejected, and the rejection adds nothing.
        let err = tracker.check_budget_on(day(1)).unwrap_err();
        assert!(matches!(err, Error::BudgetExceeded { .. }));
        assert_eq!(tracker.snapshot_on(day(1)).total_cost, dec!(0.12));
    }

    #[test]
    fn test_rejection_is_idempotent() {
        let tracker = tracker(dec!(0.10));
        tracker.record_on(dec!(0.08), 100, day(1));
        tracker.record_on(dec!(0.04), 100, day(1));
        for _ in 0..3 {
            assert!(tracker.check_budget_on(day(1)).is_err());
        }
        assert_eq!(tracker.snapshot_on(day(1)).total_cost, dec!(0.12));
        assert_eq!(tracker.snapshot_on(day(1)).request_count, 2);
    }

    #[test]
    fn test_exact_limit_rejects() {
        let tracker = tracker(dec!(0.10));
        tracker.record_on(dec!(0.10), 100, day(1));
        assert!(tracker.check_budget_on(day(1)).is_err());
    }

    #[test]
    fn test_date_rollover_zeroes_totals() {
        let tracker = tracker(dec!(0.10));
        tracker.record_on(dec!(0.09), 100, day(1));
        tracker.record_on(dec!(0.09), 100, day(1));
        assert!(tracker.check_budget_on(day(1)).is_err());

        assert!(tracker.check_budget_on(day(2)).is_ok());
        let snap = tracker.record_on(dec!(0.01), 50, day(2));
        assert_eq!(snap.total_cost, dec!(0.01));
        assert_eq!(snap.request_count, 1);
    }

    #[test]
    fn test_rollover_spans_multiple_idle_days() {
        let tracker = tracker(dec!(0.10));
        tracker.record_on(dec!(0.10), 100, day(1));
        // No requests on days 2-4; the first check on day 5 still rolls over.
        assert!(tracker.check_budget_on(day(5)).is_ok());
    }

    #[test]
    fn test_reset_roundtrip() {
        let tracker = tracker(dec!(0.10));
        tracker.record_on(dec!(0.07), 100, day(1));
        let zeroed = tracker.reset();
        assert_eq!(zeroed.total_cost, Decimal::ZERO);
        assert_eq!(zeroed.request_count, 0);

        let snap = tracker.record(dec!(0.03), 42);
        assert_eq!(snap.total_cost, dec!(0.03));
        assert_eq!(snap.request_count, 1);
        assert_eq!(snap.tokens, 42);
    }

    #[test]
    fn test_decimal_accumulation_is_exact() {
        let tracker = tracker(dec!(1.00));
        // 0.1 repeated would drift under binary floating point.
        for _ in 0..7 {
            tracker.record_on(dec!(0.1), 10, day(1));
        }
        assert_eq!(tracker.snapshot_on(day(1)).total_cost, dec!(0.7));
    }

    #[test]
    fn test_snapshot_utilization() {
        let tracker = tracker(dec!(0.10));
        let snap = tracker.record_on(dec!(0.05), 10, day(1));
        assert!((snap.utilization() - 0.5).abs() < 1e-9);

        let over = tracker.record_on(dec!(0.50), 10, day(1));
        assert_eq!(over.utilization(), 1.0);
    }
}
