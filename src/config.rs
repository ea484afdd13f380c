use crate::types::{FetchConfig, NewsletterError, ResourceConfig, Result};
use serde::{Deserialize, Serialize};

/// Token in the user prompt template replaced by the rendered context.
pub const CONTEXT_PLACEHOLDER: &str = "{{CONTEXT_DATA}}";

/// What the pipeline does when some resources fail during collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CollectionPolicy {
    /// Abort the run with an aggregate error naming every failed resource.
    #[default]
    FailFast,
    /// Log the failures and build the newsletter from what succeeded.
    Degrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptTemplates {
    pub system: String,
    pub user_template: String,
}

impl PromptTemplates {
    pub fn new(system: impl Into<String>, user_template: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user_template: user_template.into(),
        }
    }

    /// Substitute `context` for the placeholder in the user template.
    pub fn render_user(&self, context: &str) -> Result<String> {
        if !self.user_template.contains(CONTEXT_PLACEHOLDER) {
            return Err(NewsletterError::Template(format!(
                "user prompt template has no {} placeholder",
                CONTEXT_PLACEHOLDER
            )));
        }
        Ok(self.user_template.replacen(CONTEXT_PLACEHOLDER, context, 1))
    }
}

fn default_topic() -> String {
    "Vue.js".to_string()
}

/// Everything one newsletter run needs, owned and passed in explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsletterConfig {
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default)]
    pub sources: Vec<ResourceConfig>,
    pub prompts: PromptTemplates,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub collection_policy: CollectionPolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl NewsletterConfig {
    pub fn new(sources: Vec<ResourceConfig>, prompts: PromptTemplates) -> Self {
        Self {
            topic: default_topic(),
            sources,
            prompts,
            fetch: FetchConfig::default(),
            collection_policy: CollectionPolicy::default(),
            temperature: None,
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    pub fn with_policy(mut self, policy: CollectionPolicy) -> Self {
        self.collection_policy = policy;
        self
    }

    pub fn with_fetch(mut self, fetch: FetchConfig) -> Self {
        self.fetch = fetch;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}
