pub mod devto;
pub mod github;
pub mod hacker_news;
pub mod reddit;
pub mod rss_feed;

pub use devto::DevToSource;
pub use github::GitHubSearchSource;
pub use hacker_news::HackerNewsSource;
pub use reddit::RedditSource;
pub use rss_feed::RssFeedSource;

use crate::fetcher::HttpTransport;
use crate::types::{Item, NewsletterError, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::error;
use url::Url;

/// Transport handle and per-request deadline shared by the adapters of one run.
#[derive(Clone)]
pub struct FetchContext {
    pub transport: Arc<dyn HttpTransport>,
    pub timeout: Duration,
}

impl FetchContext {
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }
}

/// One `<item>` or `<entry>` of a syndication feed.
#[derive(Debug, Clone)]
pub(crate) struct FeedEntry {
    pub title: String,
    pub link: String,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
}

/// Log the issue list and build the validation error for `id`.
pub(crate) fn validation_failed(id: &str, issues: Vec<String>) -> NewsletterError {
    error!("[{}] API response validation failed: {:?}", id, issues);
    NewsletterError::ResourceValidation {
        id: id.to_string(),
        issues,
    }
}

/// Decode a JSON payload into the source's schema type.
pub(crate) fn decode<T: DeserializeOwned>(id: &str, value: serde_json::Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| validation_failed(id, vec![e.to_string()]))
}

/// Record an issue unless `value` is an absolute http(s) URL.
pub(crate) fn check_absolute_url(path: &str, value: &str, issues: &mut Vec<String>) {
    match Url::parse(value) {
        Ok(url) if url.scheme() == "http" || url.scheme() == "https" => {}
        _ => issues.push(format!("{}: invalid url {:?}", path, value)),
    }
}

/// Parse an RSS or Atom document into entries.
///
/// A document that is not a feed, or an entry whose link is not an absolute
/// URL, rejects the whole batch.
pub(crate) fn parse_feed_entries(id: &str, body: &str) -> Result<Vec<FeedEntry>> {
    let feed = parser::parse(body.as_bytes())
        .map_err(|e| validation_failed(id, vec![format!("feed: {}", e)]))?;

    let mut issues = Vec::new();
    let entries: Vec<FeedEntry> = feed
        .entries
        .into_iter()
        .map(|entry| {
            let link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref().map_or(true, |rel| rel == "alternate"))
                .or_else(|| entry.links.first())
                .map(|l| l.href.trim().to_string())
                .unwrap_or_default();

            FeedEntry {
                title: entry.title.map(|t| t.content.trim().to_string()).unwrap_or_default(),
                link,
                published: entry.published,
                updated: entry.updated,
            }
        })
        .collect();

    for (index, entry) in entries.iter().enumerate() {
        if !entry.link.is_empty() {
            check_absolute_url(&format!("entries[{}].link", index), &entry.link, &mut issues);
        }
    }

    if !issues.is_empty() {
        return Err(validation_failed(id, issues));
    }

    Ok(entries)
}

/// Parse an RFC 3339 or RFC 2822 timestamp; anything else yields `None`.
pub(crate) fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    DateTime::parse_from_rfc3339(value)
        .or_else(|_| DateTime::parse_from_rfc2822(value))
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Drop incomplete items, then keep at most `limit`.
pub(crate) fn finish(mut items: Vec<Item>, limit: usize) -> Vec<Item> {
    items.retain(Item::is_complete);
    items.truncate(limit);
    items
}
