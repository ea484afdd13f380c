use crate::config::{CollectionPolicy, NewsletterConfig};
use crate::context::render_context;
use crate::digest::{group_by_category, rank_sections};
use crate::fetcher::{Fetcher, HttpTransport};
use crate::llm_adapter::{GenerateOptions, LlmClient, LlmMessage, Usage};
use crate::registry::ResourceRegistry;
use crate::types::{NewsletterError, Result};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};

/// Generated newsletter text plus the usage reported by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct NewsletterOutput {
    pub text: String,
    pub usage: Usage,
}

/// Collect, rank, render and hand the context to an LLM.
///
/// Every run builds a fresh registry, so separate runs share no state.
pub struct NewsletterPipeline {
    config: NewsletterConfig,
    transport: Arc<dyn HttpTransport>,
    date: Option<NaiveDate>,
}

impl NewsletterPipeline {
    pub fn new(config: NewsletterConfig) -> Result<Self> {
        let fetcher = Fetcher::new(config.fetch.clone())?;
        Ok(Self::with_transport(config, Arc::new(fetcher)))
    }

    pub fn with_transport(config: NewsletterConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            date: None,
        }
    }

    /// Pin the date stamped into the context (defaults to today, UTC).
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn config(&self) -> &NewsletterConfig {
        &self.config
    }

    pub fn build_registry(&self) -> Result<ResourceRegistry> {
        let mut registry = ResourceRegistry::new(self.transport.clone(), self.config.fetch.timeout());
        for source in &self.config.sources {
            registry.register(source)?;
        }
        Ok(registry)
    }

    /// Collect from every source and render the context block.
    pub async fn build_context(&self) -> Result<String> {
        let registry = self.build_registry()?;
        let collected = registry.collect().await;

        if collected.has_errors() {
            let failures = collected.failures();
            match self.config.collection_policy {
                CollectionPolicy::FailFast => {
                    return Err(NewsletterError::AggregateCollection { failures });
                }
                CollectionPolicy::Degrade => {
                    for (id, message) in &failures {
                        warn!("Continuing without resource {}: {}", id, message);
                    }
                }
            }
        }

        let grouped = group_by_category(&collected);
        let sections = rank_sections(&grouped);
        let date = self.date.unwrap_or_else(|| Utc::now().date_naive());

        let context = render_context(&sections, date, &self.config.topic);
        info!(
            "Rendered context: {} news, {} repos, {} discussions, {} articles ({} chars)",
            sections.news.len(),
            sections.repos.len(),
            sections.discussions.len(),
            sections.articles.len(),
            context.len()
        );
        Ok(context)
    }

    pub async fn generate_newsletter(&self, llm: &dyn LlmClient) -> Result<NewsletterOutput> {
        info!("Generating newsletter with {} ({})", llm.name(), llm.model());

        let context = self.build_context().await?;

        let prompts = &self.config.prompts;
        let messages = [
            LlmMessage::system(prompts.system.trim()),
            LlmMessage::user(prompts.render_user(&context)?),
        ];
        let options = GenerateOptions {
            temperature: self.config.temperature,
            cache_system_prompt: true,
        };

        let response = llm.generate(&messages, &options).await?;
        info!(
            "Newsletter generated: {} chars, {} input / {} output tokens",
            response.text.len(),
            response.usage.input_tokens,
            response.usage.output_tokens
        );

        Ok(NewsletterOutput {
            text: response.text,
            usage: response.usage,
        })
    }
}

/// One-shot entry point: build a pipeline for `config` and run it with `llm`.
pub async fn generate_newsletter(config: NewsletterConfig, llm: &dyn LlmClient) -> Result<NewsletterOutput> {
    NewsletterPipeline::new(config)?.generate_newsletter(llm).await
}
