pub mod types;
pub mod fetcher;
pub mod retry;
pub mod traits;
pub mod sources;
pub mod registry;
pub mod digest;
pub mod context;
pub mod llm_adapter;
pub mod providers;
pub mod config;
pub mod pipeline;
pub mod utils;

pub use types::*;
pub use fetcher::{Fetcher, HttpTransport};
pub use retry::{retry_with_backoff, RetryPolicy, Sleeper, TokioSleeper};
pub use traits::Resource;
pub use registry::{Collected, ResourceInfo, ResourceRegistry};
pub use digest::GroupedItems;
pub use context::render_context;
pub use llm_adapter::{
    GenerateOptions, LlmClient, LlmMessage, LlmResponse, MockLlmClient, RetryingLlmClient, Role,
    TokenCost, Usage,
};
pub use providers::{AnthropicClient, OpenAiClient};
pub use config::{CollectionPolicy, NewsletterConfig, PromptTemplates, CONTEXT_PLACEHOLDER};
pub use pipeline::{generate_newsletter, NewsletterOutput, NewsletterPipeline};
