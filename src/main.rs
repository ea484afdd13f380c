use anyhow::Context;
use newsletter_pipeline::{
    providers, utils, NewsletterConfig, NewsletterPipeline, RetryPolicy, RetryingLlmClient,
};
use std::env;
use std::time::Instant;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let start = Instant::now();
    let config_path =
        env::var("NEWSLETTER_CONFIG").unwrap_or_else(|_| "config/newsletter.json".to_string());

    info!("Loading configuration from {}", config_path);
    let raw = tokio::fs::read_to_string(&config_path)
        .await
        .with_context(|| format!("Failed to read {}", config_path))?;
    let config = NewsletterConfig::from_json_str(&raw)
        .with_context(|| format!("Invalid configuration in {}", config_path))?;
    let title = format!("{} Weekly Newsletter", config.topic);

    let llm = providers::from_env()?;
    info!("Using {} provider ({})", llm.name(), llm.model());
    let llm = RetryingLlmClient::new(llm, RetryPolicy::default());

    let pipeline = NewsletterPipeline::new(config)?;
    let output = pipeline.generate_newsletter(&llm).await.map_err(|e| {
        error!("Newsletter generation failed: {}", e);
        e
    })?;

    let usage = &output.usage;
    info!("Tokens in/out: {}/{}", usage.input_tokens, usage.output_tokens);
    if let Some(tokens) = usage.cache_creation_input_tokens {
        info!("Cache created: {} tokens", tokens);
    }
    if let Some(tokens) = usage.cache_read_input_tokens {
        info!("Cache read: {} tokens", tokens);
    }
    info!("Estimated cost: ${:.4}", usage.estimated_cost().total_cost);

    let validation = utils::validate_newsletter_content(&output.text, &title);
    for problem in &validation.errors {
        warn!("Newsletter check: {}", problem);
    }

    println!("{}", output.text);
    info!("Finished in {:.1}s", start.elapsed().as_secs_f64());
    Ok(())
}
