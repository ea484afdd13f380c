use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::warn;

/// The normalized unit of content every source adapter produces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub title: String,
    pub url: String,
    pub date: Option<DateTime<Utc>>,
    pub score: Option<i64>,
    pub comments: Option<i64>,
    pub description: Option<String>,
    pub stars: Option<u64>,
    pub source: String,
    pub priority: Priority,
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            date: None,
            score: None,
            comments: None,
            description: None,
            stars: None,
            source: source.into(),
            priority: Priority::default(),
        }
    }

    /// Items without a title or a link are never emitted.
    pub fn is_complete(&self) -> bool {
        !self.title.trim().is_empty() && !self.url.trim().is_empty()
    }
}

/// Source priority, 1 (lowest) to 5 (highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Priority(u8);

impl Priority {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;
    pub const DEFAULT: Priority = Priority(3);

    pub fn new(value: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&value).then_some(Priority(value))
    }

    /// Resolve a configured priority, falling back to the default for
    /// missing or out-of-range values.
    pub fn resolve(resource_id: &str, configured: Option<i64>) -> Self {
        match configured {
            None => Self::DEFAULT,
            Some(value) => match u8::try_from(value).ok().and_then(Self::new) {
                Some(priority) => priority,
                None => {
                    warn!(
                        "Resource {} has out-of-range priority {} (expected {}-{}), using {}",
                        resource_id,
                        value,
                        Self::MIN,
                        Self::MAX,
                        Self::DEFAULT.0
                    );
                    Self::DEFAULT
                }
            },
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// All levels, most important first.
    pub fn descending() -> impl Iterator<Item = Priority> {
        (Self::MIN..=Self::MAX).rev().map(Priority)
    }
}

impl Default for Priority {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Rss,
    Atom,
    Json,
    Github,
    Custom,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Rss => "rss",
            ResourceKind::Atom => "atom",
            ResourceKind::Json => "json",
            ResourceKind::Github => "github",
            ResourceKind::Custom => "custom",
        };
        f.write_str(name)
    }
}

/// Content category of a resource. Assigned per adapter type, never per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    News,
    Repos,
    Discussions,
    Articles,
}

impl ContentCategory {
    /// Order in which sections appear in the rendered context.
    pub const ALL: [ContentCategory; 4] = [
        ContentCategory::News,
        ContentCategory::Repos,
        ContentCategory::Discussions,
        ContentCategory::Articles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::News => "news",
            ContentCategory::Repos => "repos",
            ContentCategory::Discussions => "discussions",
            ContentCategory::Articles => "articles",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declarative description of one configured source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceConfig {
    pub id: String,
    pub kind: ResourceKind,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_score: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl ResourceConfig {
    pub fn new(id: impl Into<String>, kind: ResourceKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            url: url.into(),
            limit: None,
            min_score: None,
            tag: None,
            priority: None,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_min_score(mut self, min_score: i64) -> Self {
        self.min_score = Some(min_score);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_ms: u64,
    pub max_redirects: usize,
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Newsletter-Pipeline/1.0".to_string(),
            timeout_ms: 10_000,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum NewsletterError {
    #[error("{status} {status_text} for {url}")]
    Http {
        status: u16,
        status_text: String,
        url: String,
    },

    #[error("Request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Resource validation failed for {id}")]
    ResourceValidation { id: String, issues: Vec<String> },

    #[error("{provider} provider error{}: {message}", status_suffix(.status))]
    Provider {
        provider: String,
        status: Option<u16>,
        message: String,
    },

    #[error(
        "Newsletter generation failed. {} resource(s) failed:\n{}",
        .failures.len(),
        failure_lines(.failures)
    )]
    AggregateCollection { failures: Vec<(String, String)> },

    #[error("No adapter for resource {id} (kind {kind})")]
    UnsupportedSource { id: String, kind: ResourceKind },

    #[error("Template error: {0}")]
    Template(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|code| format!(" ({})", code)).unwrap_or_default()
}

fn failure_lines(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(id, message)| format!("  - [{}] {}", id, message))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type Result<T> = std::result::Result<T, NewsletterError>;
