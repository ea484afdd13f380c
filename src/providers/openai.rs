use super::{error_message, http_client};
use crate::llm_adapter::{GenerateOptions, LlmClient, LlmMessage, LlmResponse, Usage};
use crate::types::{NewsletterError, Result};
use crate::utils::is_valid_api_key;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

/// OpenAI-compatible chat completions backend.
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if !is_valid_api_key(&api_key) {
            return Err(NewsletterError::Config(
                "OpenAI API key is required (set OPENAI_API_KEY)".to_string(),
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

    /// Reads `OPENAI_API_KEY` and, optionally, `OPENAI_MODEL` and `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let mut client = Self::new(std::env::var("OPENAI_API_KEY").unwrap_or_default())?;
        if let Ok(model) = std::env::var("OPENAI_MODEL") {
            if !model.trim().is_empty() {
                client = client.with_model(model);
            }
        }
        if let Ok(base_url) = std::env::var("OPENAI_BASE_URL") {
            if !base_url.trim().is_empty() {
                client = client.with_base_url(base_url);
            }
        }
        Ok(client)
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

    /// Resolve the chat completions endpoint from the base URL.
    fn endpoint(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else if base.ends_with("/v1") {
            format!("{}/chat/completions", base)
        } else {
            format!("{}/v1/chat/completions", base)
        }
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
impl LlmClient for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, messages: &[LlmMessage], options: &GenerateOptions) -> Result<LlmResponse> {
        debug!("Calling OpenAI-compatible endpoint {} ({})", self.endpoint(), self.model);

        let body = json!({
            "model": self.model,
            "temperature": options.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            "max_tokens": self.max_tokens,
            "messages": messages,
        });

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.provider_error(None, e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.provider_error(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(self.provider_error(Some(status.as_u16()), error_message(&text)));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            self.provider_error(Some(status.as_u16()), format!("Unexpected response: {}", e))
        })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| self.provider_error(Some(status.as_u16()), "response contained no text"))?;

        let usage = parsed
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
                ..Default::default()
            })
            .unwrap_or_default();

        info!(
            "OpenAI usage: {} input / {} output tokens",
            usage.input_tokens, usage.output_tokens
        );

        Ok(LlmResponse {
            text: content,
            usage,
        })
    }
}
