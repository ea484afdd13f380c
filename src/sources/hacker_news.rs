use super::{check_absolute_url, decode, finish, parse_date, validation_failed, FetchContext};
use crate::traits::Resource;
use crate::types::{ContentCategory, Item, Priority, ResourceConfig, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};
use url::form_urlencoded;

const SEARCH_ENDPOINT: &str = "https://hn.algolia.com/api/v1/search";
const ITEM_ENDPOINT: &str = "https://news.ycombinator.com/item";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: Vec<Story>,
}

#[derive(Debug, Deserialize)]
struct Story {
    #[serde(rename = "objectID")]
    object_id: String,
    title: String,
    #[serde(default)]
    url: Option<String>,
    points: i64,
    num_comments: i64,
    #[allow(dead_code)]
    author: String,
    created_at: String,
}

/// Hacker News story search.
pub struct HackerNewsSource {
    id: String,
    url: String,
    min_score: i64,
    limit: usize,
    priority: Priority,
    context: FetchContext,
}

impl HackerNewsSource {
    pub const DEFAULT_LIMIT: usize = 10;
    pub const DEFAULT_MIN_SCORE: i64 = 20;

    pub fn new(config: &ResourceConfig, context: FetchContext) -> Self {
        let url = if config.url.trim().is_empty() {
            default_search_url(config.tag.as_deref().unwrap_or("vue"))
        } else {
            config.url.clone()
        };

        Self {
            id: config.id.clone(),
            url,
            min_score: config.min_score.unwrap_or(Self::DEFAULT_MIN_SCORE),
            limit: config.limit.unwrap_or(Self::DEFAULT_LIMIT),
            priority: Priority::resolve(&config.id, config.priority),
            context,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn default_search_url(query: &str) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair("query", query)
        .append_pair("tags", "story")
        .finish();
    format!("{}?{}", SEARCH_ENDPOINT, query)
}

#[async_trait]
impl Resource for HackerNewsSource {
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
        info!("Searching Hacker News: {}", self.url);

        let raw = self
            .context
            .transport
            .get_json(&self.url, &[], self.context.timeout)
            .await?;
        let response: SearchResponse = decode(&self.id, raw)?;

        let mut issues = Vec::new();
        for (index, story) in response.hits.iter().enumerate() {
            if let Some(url) = story.url.as_deref().filter(|u| !u.is_empty()) {
                check_absolute_url(&format!("hits[{}].url", index), url, &mut issues);
            }
        }
        if !issues.is_empty() {
            return Err(validation_failed(&self.id, issues));
        }

        let total = response.hits.len();
        let mut items: Vec<Item> = response
            .hits
            .into_iter()
            .filter(|story| story.points >= self.min_score)
            .map(|story| {
                let url = story
                    .url
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| format!("{}?id={}", ITEM_ENDPOINT, story.object_id));
                Item {
                    score: Some(story.points),
                    comments: Some(story.num_comments),
                    date: parse_date(&story.created_at),
                    priority: self.priority,
                    ..Item::new(story.title, url, "Hacker News")
                }
            })
            .collect();
        debug!(
            "[{}] {} of {} stories reach {} points",
            self.id,
            items.len(),
            total,
            self.min_score
        );

        items.sort_by(|a, b| b.score.unwrap_or(0).cmp(&a.score.unwrap_or(0)));

        let items = finish(items, self.limit);
        info!("Pulled {} stories from Hacker News ({})", items.len(), self.id);
        Ok(items)
    }
}
