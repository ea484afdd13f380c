use crate::retry::{retry_with_backoff, RetryPolicy, Sleeper, TokioSleeper};
use crate::types::{NewsletterError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: Role,
    pub content: String,
}

impl LlmMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    /// Ask the backend to cache the system prompt server-side. Backends
    /// without prompt caching ignore it.
    pub cache_system_prompt: bool,
}

/// Token usage reported by a backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_read_input_tokens: Option<u64>,
}

/// Estimated spend in USD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenCost {
    pub input_cost: f64,
    pub output_cost: f64,
    pub cache_write_cost: f64,
    pub cache_read_cost: f64,
    pub total_cost: f64,
}

impl Usage {
    // Per-million-token rates
    const INPUT_RATE: f64 = 1.0;
    const OUTPUT_RATE: f64 = 5.0;
    const CACHE_WRITE_RATE: f64 = 1.25;
    const CACHE_READ_RATE: f64 = 0.10;

    pub fn estimated_cost(&self) -> TokenCost {
        let per_million = |tokens: u64, rate: f64| tokens as f64 / 1_000_000.0 * rate;

        let input_cost = per_million(self.input_tokens, Self::INPUT_RATE);
        let output_cost = per_million(self.output_tokens, Self::OUTPUT_RATE);
        let cache_write_cost = per_million(
            self.cache_creation_input_tokens.unwrap_or(0),
            Self::CACHE_WRITE_RATE,
        );
        let cache_read_cost =
            per_million(self.cache_read_input_tokens.unwrap_or(0), Self::CACHE_READ_RATE);

        TokenCost {
            input_cost,
            output_cost,
            cache_write_cost,
            cache_read_cost,
            total_cost: input_cost + output_cost + cache_write_cost + cache_read_cost,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Usage,
}

/// Text-generation backend. The pipeline never branches on which one is used.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Backend name, e.g. `anthropic`
    fn name(&self) -> &str;

    fn model(&self) -> &str;

    /// Generate a completion for `messages`.
    ///
    /// Fails with [`NewsletterError::Provider`] when the backend rejects
    /// the call or returns an unusable response.
    async fn generate(&self, messages: &[LlmMessage], options: &GenerateOptions) -> Result<LlmResponse>;
}

/// Wraps another client and retries failed `generate` calls with
/// exponential backoff.
pub struct RetryingLlmClient<C> {
    inner: C,
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl<C: LlmClient> RetryingLlmClient<C> {
    pub fn new(inner: C, policy: RetryPolicy) -> Self {
        Self {
            inner,
            policy,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }
}

#[async_trait]
impl<C: LlmClient> LlmClient for RetryingLlmClient<C> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn generate(&self, messages: &[LlmMessage], options: &GenerateOptions) -> Result<LlmResponse> {
        retry_with_backoff(&self.policy, self.sleeper.as_ref(), || {
            self.inner.generate(messages, options)
        })
        .await
    }
}

#[async_trait]
impl LlmClient for Box<dyn LlmClient> {
    fn name(&self) -> &str {
        self.as_ref().name()
    }

    fn model(&self) -> &str {
        self.as_ref().model()
    }

    async fn generate(&self, messages: &[LlmMessage], options: &GenerateOptions) -> Result<LlmResponse> {
        self.as_ref().generate(messages, options).await
    }
}

/// Deterministic offline backend for development and testing.
pub struct MockLlmClient {
    model: String,
    response_text: String,
    failure: Option<String>,
    response_delay_ms: u64,
    calls: Mutex<Vec<Vec<LlmMessage>>>,
}

impl MockLlmClient {
    pub fn new(response_text: impl Into<String>) -> Self {
        Self {
            model: "mock-1".to_string(),
            response_text: response_text.into(),
            failure: None,
            response_delay_ms: 0,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// A client whose every call fails with a provider error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::new("")
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.response_delay_ms = delay_ms;
        self
    }

    /// Message lists received so far, one entry per `generate` call.
    pub fn calls(&self) -> Vec<Vec<LlmMessage>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn estimate_tokens(text: &str) -> u64 {
        (text.chars().count() as u64).div_ceil(4)
    }
}

impl Default for MockLlmClient {
    fn default() -> Self {
        Self::new("# Vue.js Weekly Newsletter\n\n## Highlights\n\nA quiet week in the ecosystem.\n")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[LlmMessage], options: &GenerateOptions) -> Result<LlmResponse> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.to_vec());
        }

        if self.response_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.response_delay_ms)).await;
        }

        debug!(
            "Mock generation over {} messages (temperature {:?})",
            messages.len(),
            options.temperature
        );

        if let Some(message) = &self.failure {
            return Err(NewsletterError::Provider {
                provider: self.name().to_string(),
                status: None,
                message: message.clone(),
            });
        }

        let usage = Usage {
            input_tokens: messages.iter().map(|m| Self::estimate_tokens(&m.content)).sum(),
            output_tokens: Self::estimate_tokens(&self.response_text),
            ..Default::default()
        };
        info!(
            "Mock usage: {} input / {} output tokens",
            usage.input_tokens, usage.output_tokens
        );

        Ok(LlmResponse {
            text: self.response_text.clone(),
            usage,
        })
    }
}
