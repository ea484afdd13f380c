mod common;

use chrono::NaiveDate;
use common::*;
use newsletter_pipeline::{
    utils::validate_newsletter_content, CollectionPolicy, LlmClient, MockLlmClient,
    NewsletterConfig, NewsletterError, NewsletterPipeline, PromptTemplates, Result, Role,
};
use tracing::info;

fn pipeline(config: NewsletterConfig, transport: FixtureTransport) -> NewsletterPipeline {
    NewsletterPipeline::with_transport(config, transport.into_arc())
        .with_date(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap())
}

#[tokio::test]
async fn test_generate_newsletter_happy_path() -> Result<()> {
    init_tracing();
    let llm = MockLlmClient::default();
    let pipeline = pipeline(happy_path_config(), happy_path_transport());

    let output = pipeline.generate_newsletter(&llm).await?;
    info!("Generated newsletter:\n{}", output.text);

    assert!(output.text.contains("# Vue.js Weekly Newsletter"));
    assert!(output.usage.input_tokens > 0);
    assert!(output.usage.output_tokens > 0);

    let validation = validate_newsletter_content(&output.text, "Vue.js Weekly Newsletter");
    assert!(validation.is_valid, "{:?}", validation.errors);
    Ok(())
}

#[tokio::test]
async fn test_llm_receives_one_system_and_one_user_message() -> Result<()> {
    init_tracing();
    let llm = MockLlmClient::default();
    let pipeline = pipeline(happy_path_config(), happy_path_transport());

    pipeline.generate_newsletter(&llm).await?;

    let calls = llm.calls();
    assert_eq!(calls.len(), 1);
    let messages = &calls[0];
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert_eq!(messages[1].role, Role::User);

    assert_eq!(
        messages[0].content,
        "You are the editor of the Vue.js Weekly Newsletter."
    );

    let user = &messages[1].content;
    assert!(user.starts_with("Write this week's issue from the data below.\n\nCurrent Date: October 16, 2026"));
    assert!(user.ends_with("\n\nStart with the title."));
    assert!(!user.contains("{{CONTEXT_DATA}}"));
    assert!(user.contains("- [Vue 3.6 released](https://news.example.com/vue-3-6)"));
    assert!(user.contains("**[core](https://github.com/vuejs/core)** - The progressive JavaScript framework (⭐ 48,213)"));
    assert!(user.contains("**[pinia](https://github.com/vuejs/pinia)** - No description (⭐ 13,050)"));
    assert!(user.contains("https://news.ycombinator.com/item?id=102"));
    assert!(user.contains("#vue #javascript"));
    Ok(())
}

#[tokio::test]
async fn test_context_is_identical_across_runs() -> Result<()> {
    init_tracing();
    let first = pipeline(happy_path_config(), happy_path_transport())
        .build_context()
        .await?;
    let second = pipeline(happy_path_config(), happy_path_transport())
        .build_context()
        .await?;

    assert_eq!(first, second);

    // Discussions newest first regardless of which source produced them
    let nuxt = first.find("Show off your Nuxt app").unwrap();
    let pinia = first.find("Pinia or Vuex in 2026?").unwrap();
    let vapor = first.find("Vue Vapor mode deep dive").unwrap();
    assert!(nuxt < pinia && pinia < vapor);
    Ok(())
}

#[tokio::test]
async fn test_fail_fast_reports_every_failed_resource() {
    init_tracing();
    let llm = MockLlmClient::default();
    let transport = happy_path_transport()
        .with_status(REDDIT_URL, 503)
        .with_timeout(GITHUB_URL);
    let pipeline = pipeline(happy_path_config(), transport);

    let err = pipeline.generate_newsletter(&llm).await.unwrap_err();
    info!("Pipeline failed as expected: {}", err);

    match &err {
        NewsletterError::AggregateCollection { failures } => {
            let ids: Vec<&str> = failures.iter().map(|(id, _)| id.as_str()).collect();
            assert_eq!(ids, ["reddit-vue", "github-vue"]);
        }
        other => panic!("expected aggregate error, got {:?}", other),
    }

    let message = err.to_string();
    assert!(message.starts_with("Newsletter generation failed. 2 resource(s) failed:"));
    assert!(message.contains(&format!("  - [reddit-vue] 503 Service Unavailable for {}", REDDIT_URL)));
    assert!(message.contains("  - [github-vue] "));

    assert!(llm.calls().is_empty(), "LLM must not be called after a failed collection");
}

#[tokio::test]
async fn test_degrade_policy_renders_what_succeeded() -> Result<()> {
    init_tracing();
    let llm = MockLlmClient::default();
    let transport = happy_path_transport().with_status(REDDIT_URL, 503);
    let config = happy_path_config().with_policy(CollectionPolicy::Degrade);
    let pipeline = pipeline(config, transport);

    let output = pipeline.generate_newsletter(&llm).await?;
    assert!(!output.text.is_empty());

    let user = &llm.calls()[0][1].content;
    assert!(!user.contains("r/vuejs"));
    assert!(user.contains("Vue Vapor mode deep dive"));
    assert!(user.contains("Composables you should know"));
    Ok(())
}

#[tokio::test]
async fn test_missing_placeholder_is_a_template_error() {
    init_tracing();
    let llm = MockLlmClient::default();
    let config = NewsletterConfig::new(
        happy_path_sources(),
        PromptTemplates::new("System prompt", "No context slot in here."),
    );

    let err = pipeline(config, happy_path_transport())
        .generate_newsletter(&llm)
        .await
        .unwrap_err();

    assert!(matches!(err, NewsletterError::Template(_)), "got {:?}", err);
    assert!(llm.calls().is_empty());
}

#[tokio::test]
async fn test_unsupported_source_fails_before_fetching() {
    init_tracing();
    let mut sources = happy_path_sources();
    sources.push(newsletter_pipeline::ResourceConfig::new(
        "lobsters",
        newsletter_pipeline::ResourceKind::Json,
        "https://lobste.rs/t/vue.json",
    ));
    let transport = std::sync::Arc::new(happy_path_transport());
    let pipeline = NewsletterPipeline::with_transport(
        NewsletterConfig::new(sources, prompts()),
        transport.clone(),
    );

    let err = pipeline.build_context().await.unwrap_err();

    assert!(matches!(err, NewsletterError::UnsupportedSource { .. }), "got {:?}", err);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_provider_failure_propagates() {
    init_tracing();
    let llm = MockLlmClient::failing("overloaded");
    let pipeline = pipeline(happy_path_config(), happy_path_transport());

    let err = pipeline.generate_newsletter(&llm).await.unwrap_err();

    match err {
        NewsletterError::Provider { provider, message, .. } => {
            assert_eq!(provider, llm.name());
            assert_eq!(message, "overloaded");
        }
        other => panic!("expected provider error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_topic_flows_into_context() -> Result<()> {
    init_tracing();
    let config = NewsletterConfig::new(Vec::new(), prompts()).with_topic("Svelte");

    let context = pipeline(config, FixtureTransport::new()).build_context().await?;

    assert!(context.contains("Recent Svelte Projects:"));
    assert!(context.contains("- No recent Svelte news available"));
    assert!(context.contains("Trending Svelte Repositories:"));
    Ok(())
}

#[test]
fn test_config_from_json() -> Result<()> {
    let raw = r#"{
        "sources": [
            { "id": "vue-news", "kind": "rss", "url": "https://news.example.com/vue/feed.xml", "limit": 5 },
            { "id": "hn-vue", "kind": "json", "minScore": 50, "priority": 4 },
            { "id": "github-vue", "kind": "github", "url": "https://api.github.com/search/repositories?q=vue" }
        ],
        "prompts": {
            "system": "You write newsletters.",
            "userTemplate": "Data:\n{{CONTEXT_DATA}}"
        },
        "fetch": { "timeoutMs": 2500 },
        "collectionPolicy": "degrade"
    }"#;

    let config = NewsletterConfig::from_json_str(raw)?;

    assert_eq!(config.topic, "Vue.js");
    assert_eq!(config.sources.len(), 3);
    assert_eq!(config.sources[0].limit, Some(5));
    assert_eq!(config.sources[1].min_score, Some(50));
    assert_eq!(config.sources[1].priority, Some(4));
    assert!(config.sources[1].url.is_empty());
    assert_eq!(config.fetch.timeout_ms, 2500);
    assert_eq!(config.fetch.max_redirects, 5);
    assert_eq!(config.collection_policy, CollectionPolicy::Degrade);
    assert_eq!(config.prompts.render_user("X")?, "Data:\nX");
    Ok(())
}

#[test]
fn test_invalid_config_is_rejected() {
    let err = NewsletterConfig::from_json_str(r#"{ "sources": [{ "id": "x", "kind": "ftp" }], "prompts": { "system": "", "userTemplate": "" } }"#)
        .unwrap_err();
    assert!(matches!(err, NewsletterError::Serialization(_)));
}

#[test]
fn test_placeholder_substituted_once() -> Result<()> {
    let prompts = PromptTemplates::new("sys", "{{CONTEXT_DATA}} and again {{CONTEXT_DATA}}");
    assert_eq!(prompts.render_user("ctx")?, "ctx and again {{CONTEXT_DATA}}");
    Ok(())
}

#[test]
fn test_placeholder_detection() {
    use newsletter_pipeline::utils::has_placeholder_content;

    assert!(has_placeholder_content("See [Insert link here] for details"));
    assert!(has_placeholder_content("[A]"));
    assert!(!has_placeholder_content("lowercase [link] only"));
    assert!(!has_placeholder_content("dangling [Unclosed bracket"));
    assert!(!has_placeholder_content("closed first ] then [Open"));
    assert!(!has_placeholder_content(""));

    let long = format!("{}[Placeholder]", "[Abc ".repeat(50_000));
    assert!(has_placeholder_content(&long));
    assert!(!has_placeholder_content(&"[Abc ".repeat(50_000)));
}
