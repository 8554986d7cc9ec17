//! Security limit configuration consumed by the guard layer.

use std::env;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const DEFAULT_MAX_REQUESTS_PER_PERIOD: usize = 4;
const DEFAULT_RATE_LIMIT_PERIOD: Duration = Duration::from_secs(60);
const DEFAULT_MAX_DAILY_COST: Decimal = dec!(0.10);
const DEFAULT_MAX_TEXT_LENGTH: usize = 5000;
const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

/// Externally-supplied limits for the guard layer.
///
/// The core never mutates these; they are read at check time. `max_file_size`
/// and `allowed_mime_types` are consumed only by [`crate::validate_upload`],
/// the upload-validation helper for the embedding surface.
#[derive(Clone, Debug)]
pub struct SecurityLimits {
    /// Accepted requests per caller per rolling window.
    pub max_requests_per_period: usize,
    /// Length of the rolling rate-limit window.
    pub rate_limit_period: Duration,
    /// Daily spend ceiling in currency units.
    pub max_daily_cost: Decimal,
    /// Maximum analyzed text length in characters.
    pub max_text_length: usize,
    /// Maximum upload size in bytes.
    pub max_file_size: u64,
    /// MIME types accepted for uploads.
    pub allowed_mime_types: Vec<String>,
}

impl Default for SecurityLimits {
    fn default() -> Self {
        Self {
            max_requests_per_period: DEFAULT_MAX_REQUESTS_PER_PERIOD,
            rate_limit_period: DEFAULT_RATE_LIMIT_PERIOD,
            max_daily_cost: DEFAULT_MAX_DAILY_COST,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_mime_types: vec!["image/jpeg".into(), "image/png".into()],
        }
    }
}

impl SecurityLimits {
    /// Build limits from `VIBE_GUARD_*` environment variables, falling back
    /// to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_requests_per_period: env_parse("VIBE_GUARD_MAX_REQUESTS")
                .unwrap_or(defaults.max_requests_per_period),
            rate_limit_period: env_parse::<u64>("VIBE_GUARD_RATE_PERIOD_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.rate_limit_period),
            max_daily_cost: env_parse("VIBE_GUARD_MAX_DAILY_COST")
                .unwrap_or(defaults.max_daily_cost),
            max_text_length: env_parse("VIBE_GUARD_MAX_TEXT_LENGTH")
                .unwrap_or(defaults.max_text_length),
            max_file_size: env_parse("VIBE_GUARD_MAX_FILE_SIZE")
                .unwrap_or(defaults.max_file_size),
            allowed_mime_types: env::var("VIBE_GUARD_ALLOWED_MIME_TYPES")
                .ok()
                .map(|v| v.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.allowed_mime_types),
        }
    }

    /// Reject configurations the guards cannot enforce meaningfully.
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_requests_per_period == 0 {
            return Err(crate::Error::Config(
                "max_requests_per_period must be at least 1".into(),
            ));
        }
        if self.rate_limit_period.is_zero() {
            return Err(crate::Error::Config(
                "rate_limit_period must be non-zero".into(),
            ));
        }
        if self.max_daily_cost < Decimal::ZERO {
            return Err(crate::Error::Config(
                "max_daily_cost must be non-negative".into(),
            ));
        }
        if self.max_text_length == 0 {
            return Err(crate::Error::Config(
                "max_text_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
