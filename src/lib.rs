//! # vibe-guard
//!
//! Guarded conversational-tone analysis over a paid completion API.
//!
//! The crate's core is the guard layer between a user-facing surface and the
//! upstream service: a per-caller sliding-window [`RateLimiter`] and a daily
//! [`CostTracker`] with exact-decimal accounting. [`VibeAnalyzer`] binds the
//! two in front of the completion call and returns the analysis text together
//! with a [`UsageSnapshot`] the presentation layer can render.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vibe_guard::analyze;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vibe_guard::Error> {
//!     let analysis = analyze("hey, any update on the review? no rush!").await?;
//!     println!("{}", analysis);
//!     Ok(())
//! }
//! ```
//!
//! ## Guarded session
//!
//! ```rust,no_run
//! use vibe_guard::{AnalyzeRequest, SecurityLimits, VibeAnalyzer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), vibe_guard::Error> {
//!     let analyzer = VibeAnalyzer::builder()
//!         .limits(SecurityLimits::default())
//!         .build()?;
//!
//!     let request = AnalyzeRequest::new("paste your conversation here")
//!         .with_context("a chat between two coworkers");
//!     let analysis = analyzer.analyze_for("session-1b2f", request).await?;
//!     println!("{}", analysis.text);
//!     println!("spent today: ${}", analysis.snapshot.total_cost);
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod analyzer;
pub mod client;
pub mod config;
pub mod limits;
mod validate;

pub use analyzer::{Analysis, AnalyzeRequest, VibeAnalyzer, VibeAnalyzerBuilder, build_prompt};
pub use client::{
    Completion, CompletionBackend, DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiClient,
    OpenAiClientBuilder, Usage, cost_for,
};
pub use config::SecurityLimits;
pub use limits::{CostTracker, RateDecision, RateLimiter, UsageSnapshot};
pub use validate::{sanitize_text, validate_upload};

use rust_decimal::Decimal;

/// Error type for vibe-guard operations.
///
/// Every variant is user-actionable and none is fatal to the process; the
/// presentation layer classifies them through [`Error::category`].
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Caller is over the sliding-window request limit.
    #[error("Rate limit exceeded, retry in {}s", retry_after.as_secs())]
    RateLimited { retry_after: std::time::Duration },

    /// The daily spend ceiling has been reached.
    #[error("Daily cost limit of ${limit} exceeded (${used} spent)")]
    BudgetExceeded { limit: Decimal, used: Decimal },

    /// Submitted text was empty after trimming.
    #[error("No text to analyze")]
    EmptyInput,

    /// Submitted text exceeds the configured length cap.
    #[error("Text exceeds maximum length of {max} characters (got {length})")]
    InputTooLong { length: usize, max: usize },

    /// Upload exceeds the configured size cap.
    #[error("File too large: {size} bytes (limit {max})")]
    FileTooLarge { size: u64, max: u64 },

    /// Upload MIME type is not on the allow-list.
    #[error("Unsupported file type: {mime}")]
    UnsupportedFileType { mime: String },

    /// Upstream service returned an error response.
    #[error("API error (HTTP {status}): {message}", status = status.map(|s| s.to_string()).unwrap_or_else(|| "unknown".into()))]
    Api {
        message: String,
        status: Option<u16>,
        error_type: Option<String>,
    },

    /// Upstream authentication failed.
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Network connectivity or request failed (including timeouts).
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error category for unified handling in the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A guard denied the request; recoverable by waiting or resetting.
    GuardLimit,
    /// Caller-correctable input validation failure.
    InvalidInput,
    /// Upstream service failure (network, auth, quota), surfaced verbatim.
    Upstream,
    /// Configuration or setup error.
    Configuration,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::RateLimited { .. } | Error::BudgetExceeded { .. } => ErrorCategory::GuardLimit,

            Error::EmptyInput
            | Error::InputTooLong { .. }
            | Error::FileTooLarge { .. }
            | Error::UnsupportedFileType { .. } => ErrorCategory::InvalidInput,

            Error::Api { .. } | Error::Auth { .. } | Error::Network(_) | Error::Json(_) => {
                ErrorCategory::Upstream
            }

            Error::Config(_) => ErrorCategory::Configuration,
        }
    }

    /// Whether the same request can succeed later without being changed
    /// (after a wait, a rollover, or an explicit reset).
    pub fn is_recoverable(&self) -> bool {
        self.category() == ErrorCategory::GuardLimit
    }

    pub fn is_invalid_input(&self) -> bool {
        self.category() == ErrorCategory::InvalidInput
    }

    pub fn is_upstream(&self) -> bool {
        self.category() == ErrorCategory::Upstream
    }

    /// Suggested wait for rate-limited callers.
    pub fn retry_after(&self) -> Option<std::time::Duration> {
        match self {
            Error::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// One-shot analysis with env-derived limits and client. Builds a fresh
/// session; embedders that need the guard state to persist across requests
/// should hold a [`VibeAnalyzer`].
pub async fn analyze(text: &str) -> Result<String> {
    let analyzer = VibeAnalyzer::builder().build()?;
    let analysis = analyzer.analyze(AnalyzeRequest::new(text)).await?;
    Ok(analysis.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_display() {
        let err = Error::BudgetExceeded {
            limit: dec!(0.10),
            used: dec!(0.12),
        };
        assert_eq!(
            err.to_string(),
            "Daily cost limit of $0.10 exceeded ($0.12 spent)"
        );
    }

    #[test]
    fn test_rate_limited_display_includes_wait() {
        let err = Error::RateLimited {
            retry_after: std::time::Duration::from_secs(42),
        };
        assert!(err.to_string().contains("42s"));
    }

    #[test]
    fn test_error_categories() {
        let limited = Error::RateLimited {
            retry_after: std::time::Duration::from_secs(1),
        };
        assert_eq!(limited.category(), ErrorCategory::GuardLimit);
        assert!(limited.is_recoverable());

        assert_eq!(Error::EmptyInput.category(), ErrorCategory::InvalidInput);
        assert!(Error::EmptyInput.is_invalid_input());

        let api = Error::Api {
            message: "overloaded".into(),
            status: Some(503),
            error_type: None,
        };
        assert_eq!(api.category(), ErrorCategory::Upstream);
        assert!(!api.is_recoverable());

        assert_eq!(
            Error::Config("bad".into()).category(),
            ErrorCategory::Configuration
        );
    }

    #[test]
    fn test_retry_after_accessor() {
        let err = Error::RateLimited {
            retry_after: std::time::Duration::from_secs(7),
        };
        assert_eq!(err.retry_after(), Some(std::time::Duration::from_secs(7)));
        assert_eq!(Error::EmptyInput.retry_after(), None);
    }
}
