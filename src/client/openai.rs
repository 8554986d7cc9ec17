//! OpenAI chat-completions backend.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Completion, CompletionBackend, Usage, pricing};
use crate::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
// Tone analysis wants reproducible output.
const TEMPERATURE: f32 = 0.0;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: WireUsage,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Default, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

/// Client for the OpenAI chat-completions endpoint.
///
/// Fixed model and temperature per construction; every call is unary with a
/// request timeout. A timeout or transport failure surfaces as
/// [`Error::Network`] with no retry.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl OpenAiClient {
    pub fn builder() -> OpenAiClientBuilder {
        OpenAiClientBuilder::default()
    }

    /// Build a client from `OPENAI_API_KEY` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Self::builder().build()
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    async fn complete(&self, prompt: &str) -> Result<Completion> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = ChatRequest {
            model: &self.model,
            temperature: TEMPERATURE,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!(model = %self.model, prompt_chars = prompt.len(), "sending completion request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            let (message, error_type) = match serde_json::from_str::<ErrorBody>(&text) {
                Ok(parsed) => (parsed.error.message, parsed.error.error_type),
                Err(_) => (text, None),
            };
            return Err(match status {
                401 | 403 => Error::Auth { message },
                _ => Error::Api {
                    message,
                    status: Some(status),
                    error_type,
                },
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Api {
                message: "completion response contained no choices".into(),
                status: None,
                error_type: None,
            })?;

        let usage = Usage {
            prompt_tokens: parsed.usage.prompt_tokens,
            completion_tokens: parsed.usage.completion_tokens,
        };
        let cost = pricing::cost_for(&self.model, &usage);
        debug!(tokens = usage.total(), cost = %cost, "completion received");

        Ok(Completion { text, usage, cost })
    }
}

/// Builder for [`OpenAiClient`].
#[derive(Default)]
pub struct OpenAiClientBuilder {
    api_key: Option<SecretString>,
    base_url: Option<String>,
    model: Option<String>,
    timeout: Option<Duration>,
}

impl OpenAiClientBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretString::from(key.into()));
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OpenAiClient> {
        let api_key = match self.api_key {
            Some(key) => key,
            None => SecretString::from(
                std::env::var("OPENAI_API_KEY")
                    .map_err(|_| Error::Config("OPENAI_API_KEY is not set".into()))?,
            ),
        };
        if !api_key.expose_secret().starts_with("sk-") {
            return Err(Error::Config(
                "invalid API key configuration: expected an sk- prefixed key".into(),
            ));
        }

        let base_url = self
            .base_url
            .or_else(|| std::env::var("OPENAI_BASE_URL").ok())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();

        let http = reqwest::Client::builder()
            .timeout(self.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .build()
            .map_err(Error::Network)?;

        Ok(OpenAiClient {
            http,
            base_url,
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        })
    }
}
