pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

use crate::llm_adapter::LlmClient;
use crate::types::{NewsletterError, Result};
use std::time::Duration;

const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Pick a backend from `LLM_PROVIDER` (`anthropic` by default, or `openai`).
pub fn from_env() -> Result<Box<dyn LlmClient>> {
    let provider = std::env::var("LLM_PROVIDER")
        .unwrap_or_else(|_| "anthropic".to_string())
        .to_lowercase();

    match provider.as_str() {
        "anthropic" => Ok(Box::new(AnthropicClient::from_env()?)),
        "openai" => Ok(Box::new(OpenAiClient::from_env()?)),
        other => Err(NewsletterError::Config(format!("Unknown LLM_PROVIDER: {}", other))),
    }
}

fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Pull `error.message` out of an API error body, falling back to the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
