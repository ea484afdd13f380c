use super::{finish, parse_feed_entries, FetchContext};
use crate::traits::Resource;
use crate::types::{ContentCategory, Item, Priority, ResourceConfig, Result};
use async_trait::async_trait;
use tracing::info;
use url::Url;

/// Reddit rejects requests carrying generic client user agents.
pub const REDDIT_USER_AGENT: &str = "Vue-Newsletter-Generator/1.0";

/// Subreddit Atom feed, newest entries first.
pub struct RedditSource {
    id: String,
    url: String,
    subreddit: String,
    limit: usize,
    priority: Priority,
    context: FetchContext,
}

impl RedditSource {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(config: &ResourceConfig, context: FetchContext) -> Self {
        // The label always follows the URL actually fetched; the tag only
        // fills in when the URL names no subreddit.
        let subreddit = subreddit_from_url(&config.url)
            .or_else(|| config.tag.clone())
            .unwrap_or_else(|| "reddit".to_string());

        Self {
            id: config.id.clone(),
            url: config.url.clone(),
            subreddit,
            limit: config.limit.unwrap_or(Self::DEFAULT_LIMIT),
            priority: Priority::resolve(&config.id, config.priority),
            context,
        }
    }

    /// Label used as the `source` of every emitted item, e.g. `r/vuejs`.
    pub fn source_label(&self) -> String {
        format!("r/{}", self.subreddit)
    }
}

/// Extract the path segment following `/r/`, without any `.rss`/`.json` suffix.
pub fn subreddit_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let mut segments = parsed.path_segments()?;
    segments.find(|segment| *segment == "r")?;

    let name = segments.next()?;
    let name = name
        .strip_suffix(".rss")
        .or_else(|| name.strip_suffix(".json"))
        .unwrap_or(name);

    (!name.is_empty()).then(|| name.to_string())
}

#[async_trait]
impl Resource for RedditSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> ContentCategory {
        ContentCategory::Discussions
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn fetch(&self) -> Result<Vec<Item>> {
        info!("Pulling subreddit feed: {}", self.url);

        let body = self
            .context
            .transport
            .get_text(&self.url, &[("User-Agent", REDDIT_USER_AGENT)], self.context.timeout)
            .await?;
        let entries = parse_feed_entries(&self.id, &body)?;

        let source = self.source_label();
        let mut items: Vec<Item> = entries
            .into_iter()
            .map(|entry| Item {
                date: entry.updated.or(entry.published),
                priority: self.priority,
                ..Item::new(entry.title, entry.link, source.clone())
            })
            .collect();

        // Newest first; undated entries sink to the end
        items.sort_by(|a, b| b.date.cmp(&a.date));

        let items = finish(items, self.limit);
        info!("Pulled {} posts from {}", items.len(), source);
        Ok(items)
    }
}
