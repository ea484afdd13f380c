use super::{error_message, http_client};
use crate::llm_adapter::{GenerateOptions, LlmClient, LlmMessage, LlmResponse, Role, Usage};
use crate::types::{NewsletterError, Result};
use crate::utils::is_valid_api_key;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

/// Anthropic Messages API backend.
pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl AnthropicClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if !is_valid_api_key(&api_key) {
            return Err(NewsletterError::Config(
                "Anthropic API key is required (set ANTHROPIC_API_KEY)".to_string(),
            ));
        }

        Ok(Self {
            client: http_client()?,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Reads `ANTHROPIC_API_KEY` and, optionally, `ANTHROPIC_MODEL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY").unwrap_or_default();
        let client = Self::new(api_key)?;
        Ok(match std::env::var("ANTHROPIC_MODEL") {
            Ok(model) if !model.trim().is_empty() => client.with_model(model),
            _ => client,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    fn request_body(&self, messages: &[LlmMessage], options: &GenerateOptions) -> Value {
        let system = messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let conversation: Vec<&LlmMessage> = messages
            .iter()
            .filter(|m| m.role != Role::System)
            .collect();

        let system = if options.cache_system_prompt {
            json!([{
                "type": "text",
                "text": system,
                "cache_control": { "type": "ephemeral" }
            }])
        } else {
            json!(system)
        };

        json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "system": system,
            "messages": conversation,
        })
    }

    fn provider_error(&self, status: Option<u16>, message: impl Into<String>) -> NewsletterError {
        NewsletterError::Provider {
            provider: self.name().to_string(),
            status,
            message: message.into(),
        }
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[LlmMessage], options: &GenerateOptions) -> Result<LlmResponse> {
        debug!(
            "Calling Anthropic {} (max_tokens {}, cache_system_prompt {})",
            self.model, self.max_tokens, options.cache_system_prompt
        );

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&self.request_body(messages, options))
            .send()
            .await
            .map_err(|e| self.provider_error(None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.provider_error(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(self.provider_error(Some(status.as_u16()), error_message(&body)));
        }

        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            self.provider_error(Some(status.as_u16()), format!("Unexpected response: {}", e))
        })?;

        let text = parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .find_map(|block| block.text.filter(|t| !t.trim().is_empty()))
            .ok_or_else(|| self.provider_error(Some(status.as_u16()), "response contained no text"))?;

        info!(
            "Anthropic usage: {} input / {} output tokens",
            parsed.usage.input_tokens, parsed.usage.output_tokens
        );

        Ok(LlmResponse {
            text,
            usage: parsed.usage,
        })
    }
}
