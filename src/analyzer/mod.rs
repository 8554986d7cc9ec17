//! Analysis orchestration: guards in front of the upstream completion call.

mod prompt;

pub use prompt::build_prompt;

use std::sync::Arc;

use tracing::{info, warn};

use crate::client::{CompletionBackend, OpenAiClient};
use crate::config::SecurityLimits;
use crate::limits::{CostTracker, RateDecision, RateLimiter, UsageSnapshot};
use crate::validate::sanitize_text;
use crate::{Error, Result};

/// One analysis request: the text plus optional background and questions.
#[derive(Debug, Clone, Default)]
pub struct AnalyzeRequest {
    pub text: String,
    pub context: Option<String>,
    pub questions: Option<String>,
}

impl AnalyzeRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_questions(mut self, questions: impl Into<String>) -> Self {
        self.questions = Some(questions.into());
        self
    }
}

/// Result of a successful analysis: the generated text and the accounting
/// snapshot after the call was recorded.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub text: String,
    pub snapshot: UsageSnapshot,
}

/// Guarded tone analyzer.
///
/// Owns the session's [`RateLimiter`] and [`CostTracker`] and sequences every
/// request as: rate gate (on the [`analyze_for`](Self::analyze_for) surface)
/// → input validation → budget pre-check → prompt build → upstream call →
/// post-call accounting. Nothing is recorded on any failure path.
pub struct VibeAnalyzer {
    limits: SecurityLimits,
    rate_limiter: RateLimiter,
    cost_tracker: CostTracker,
    backend: Arc<dyn CompletionBackend>,
}

impl VibeAnalyzer {
    pub fn new(limits: SecurityLimits, backend: Arc<dyn CompletionBackend>) -> Result<Self> {
        limits.validate()?;
        Ok(Self {
            rate_limiter: RateLimiter::new(&limits),
            cost_tracker: CostTracker::new(&limits),
            backend,
            limits,
        })
    }

    pub fn builder() -> VibeAnalyzerBuilder {
        VibeAnalyzerBuilder::default()
    }

    /// Rate gate for embedders that reject at their own edge before calling
    /// [`analyze`](Self::analyze). An allowed decision counts the request.
    pub fn check_rate_limit(&self, caller: &str) -> RateDecision {
        self.rate_limiter.check(caller)
    }

    /// Full gate sequence for one caller. This is the recommended entry
    /// point: a denied rate check fails with [`Error::RateLimited`] before
    /// any other work.
    pub async fn analyze_for(&self, caller: &str, request: AnalyzeRequest) -> Result<Analysis> {
        match self.rate_limiter.check(caller) {
            RateDecision::Allowed => self.analyze(request).await,
            RateDecision::Limited { retry_after } => Err(Error::RateLimited { retry_after }),
        }
    }

    /// Validate, pre-check the budget, call upstream, and account for the
    /// response. Upstream failures surface verbatim with no accounting
    /// mutation.
    pub async fn analyze(&self, request: AnalyzeRequest) -> Result<Analysis> {
        let text = sanitize_text(&request.text, self.limits.max_text_length)?;
        let context = self.sanitize_optional(request.context.as_deref())?;
        let questions = self.sanitize_optional(request.questions.as_deref())?;

        self.cost_tracker.check_budget()?;

        let prompt = build_prompt(text, context, questions);
        let completion = self.backend.complete(&prompt).await.inspect_err(|e| {
            warn!(error = %e, "upstream completion failed");
        })?;

        let snapshot = self
            .cost_tracker
            .record(completion.cost, completion.usage.total());
        info!(
            tokens = snapshot.tokens,
            total_cost = %snapshot.total_cost,
            "analysis completed"
        );

        Ok(Analysis {
            text: completion.text,
            snapshot,
        })
    }

    /// Requests counted for `caller` in the current window, for display.
    pub fn recent_requests(&self, caller: &str) -> usize {
        self.rate_limiter.recent_count(caller)
    }

    /// Current accounting totals without recording anything.
    pub fn usage(&self) -> UsageSnapshot {
        self.cost_tracker.snapshot()
    }

    /// Reset both guards: clear every caller's request log and zero today's
    /// cost accounting. Returns the zeroed snapshot.
    pub fn reset_tracking(&self) -> UsageSnapshot {
        self.rate_limiter.reset();
        self.cost_tracker.reset()
    }

    fn sanitize_optional<'a>(&self, value: Option<&'a str>) -> Result<Option<&'a str>> {
        match value {
            // Optional sections may be blank without failing the request.
            Some(v) if v.trim().is_empty() => Ok(None),
            Some(v) => sanitize_text(v, self.limits.max_text_length).map(Some),
            None => Ok(None),
        }
    }
}

/// Builder for [`VibeAnalyzer`].
#[derive(Default)]
pub struct VibeAnalyzerBuilder {
    limits: Option<SecurityLimits>,
    backend: Option<Arc<dyn CompletionBackend>>,
}

impl VibeAnalyzerBuilder {
    pub fn limits(mut self, limits: SecurityLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    pub fn backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Build the analyzer, defaulting to env-derived limits and an
    /// [`OpenAiClient`] from `OPENAI_API_KEY` when unset.
    pub fn build(self) -> Result<VibeAnalyzer> {
        let limits = self.limits.unwrap_or_else(SecurityLimits::from_env);
        let backend = match self.backend {
            Some(backend) => backend,
            None => Arc::new(OpenAiClient::from_env()?),
        };
        VibeAnalyzer::new(limits, backend)
    }
}
