//! Upstream completion service client.

mod openai;
mod pricing;

pub use openai::{DEFAULT_BASE_URL, DEFAULT_MODEL, OpenAiClient, OpenAiClientBuilder};
pub use pricing::cost_for;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Token usage metered by the upstream service for one call.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Usage {
    /// Tokens consumed by the prompt.
    pub prompt_tokens: u32,
    /// Tokens generated in the completion.
    pub completion_tokens: u32,
}

impl Usage {
    /// Total tokens for the call (prompt + completion).
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// One successful upstream completion with its metered usage and estimated
/// cost for that single call.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
    pub cost: Decimal,
}

/// Seam to the external completion service.
///
/// The guard layer only needs "prompt in, text plus metered usage out";
/// failures are surfaced verbatim, never swallowed or retried here.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion>;
}
