use super::{finish, parse_feed_entries, FetchContext};
use crate::traits::Resource;
use crate::types::{ContentCategory, Item, Priority, ResourceConfig, Result};
use async_trait::async_trait;
use tracing::info;

/// Generic RSS 2.0 news feed. Items keep feed order.
pub struct RssFeedSource {
    id: String,
    url: String,
    source_name: String,
    limit: usize,
    priority: Priority,
    context: FetchContext,
}

impl RssFeedSource {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(config: &ResourceConfig, context: FetchContext) -> Self {
        Self {
            id: config.id.clone(),
            url: config.url.clone(),
            source_name: config.tag.clone().unwrap_or_else(|| "RSS".to_string()),
            limit: config.limit.unwrap_or(Self::DEFAULT_LIMIT),
            priority: Priority::resolve(&config.id, config.priority),
            context,
        }
    }
}

#[async_trait]
impl Resource for RssFeedSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> ContentCategory {
        ContentCategory::News
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn fetch(&self) -> Result<Vec<Item>> {
        info!("Pulling RSS feed: {}", self.url);

        let body = self
            .context
            .transport
            .get_text(&self.url, &[], self.context.timeout)
            .await?;
        let entries = parse_feed_entries(&self.id, &body)?;

        let items = entries
            .into_iter()
            .map(|entry| Item {
                date: entry.published.or(entry.updated),
                priority: self.priority,
                ..Item::new(entry.title, entry.link, self.source_name.clone())
            })
            .collect();

        let items = finish(items, self.limit);
        info!("Pulled {} items from RSS feed {}", items.len(), self.id);
        Ok(items)
    }
}
