use super::{check_absolute_url, decode, finish, parse_date, validation_failed, FetchContext};
use crate::traits::Resource;
use crate::types::{ContentCategory, Item, Priority, ResourceConfig, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct Article {
    // Required by the payload shape, not read
    #[allow(dead_code)]
    id: i64,
    title: String,
    url: String,
    #[serde(default)]
    published_at: Option<String>,
    public_reactions_count: i64,
    comments_count: i64,
    tag_list: Vec<String>,
    // Shape-checked when present, not read
    #[serde(default)]
    #[allow(dead_code)]
    user: Option<Author>,
}

#[derive(Debug, Deserialize)]
struct Author {
    #[allow(dead_code)]
    name: String,
}

/// DEV.to article listing, most reacted first.
pub struct DevToSource {
    id: String,
    url: String,
    source_name: String,
    limit: usize,
    priority: Priority,
    context: FetchContext,
}

impl DevToSource {
    pub const DEFAULT_LIMIT: usize = 10;

    pub fn new(config: &ResourceConfig, context: FetchContext) -> Self {
        Self {
            id: config.id.clone(),
            url: config.url.clone(),
            source_name: config.tag.clone().unwrap_or_else(|| "DEV.to".to_string()),
            limit: config.limit.unwrap_or(Self::DEFAULT_LIMIT),
            priority: Priority::resolve(&config.id, config.priority),
            context,
        }
    }
}

fn render_tags(tags: &[String]) -> Option<String> {
    let tags: Vec<String> = tags
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| format!("#{}", t))
        .collect();
    (!tags.is_empty()).then(|| tags.join(" "))
}

#[async_trait]
impl Resource for DevToSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> ContentCategory {
        ContentCategory::Articles
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn fetch(&self) -> Result<Vec<Item>> {
        info!("Pulling DEV.to articles: {}", self.url);

        let raw = self
            .context
            .transport
            .get_json(&self.url, &[], self.context.timeout)
            .await?;
        let mut articles: Vec<Article> = decode(&self.id, raw)?;

        let mut issues = Vec::new();
        for (index, article) in articles.iter().enumerate() {
            if !article.url.trim().is_empty() {
                check_absolute_url(&format!("[{}].url", index), &article.url, &mut issues);
            }
        }
        if !issues.is_empty() {
            return Err(validation_failed(&self.id, issues));
        }

        articles.sort_by(|a, b| b.public_reactions_count.cmp(&a.public_reactions_count));

        let items = articles
            .into_iter()
            .map(|article| Item {
                date: article.published_at.as_deref().and_then(parse_date),
                score: Some(article.public_reactions_count),
                comments: Some(article.comments_count),
                description: render_tags(&article.tag_list),
                priority: self.priority,
                ..Item::new(article.title, article.url, self.source_name.clone())
            })
            .collect();

        let items = finish(items, self.limit);
        info!("Pulled {} articles from {}", items.len(), self.id);
        Ok(items)
    }
}
