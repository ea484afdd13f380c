use super::{check_absolute_url, decode, finish, parse_date, validation_failed, FetchContext};
use crate::traits::Resource;
use crate::types::{ContentCategory, Item, Priority, ResourceConfig, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

const GITHUB_API_ACCEPT: &str = "application/vnd.github+json";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<Repository>,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
    html_url: String,
    description: Option<String>,
    stargazers_count: u64,
    pushed_at: String,
}

/// GitHub repository search. The full query URL comes from configuration.
pub struct GitHubSearchSource {
    id: String,
    url: String,
    limit: usize,
    priority: Priority,
    context: FetchContext,
}

impl GitHubSearchSource {
    pub const DEFAULT_LIMIT: usize = 5;

    pub fn new(config: &ResourceConfig, context: FetchContext) -> Self {
        Self {
            id: config.id.clone(),
            url: config.url.clone(),
            limit: config.limit.unwrap_or(Self::DEFAULT_LIMIT),
            priority: Priority::resolve(&config.id, config.priority),
            context,
        }
    }
}

#[async_trait]
impl Resource for GitHubSearchSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn category(&self) -> ContentCategory {
        ContentCategory::Repos
    }

    fn priority(&self) -> Priority {
        self.priority
    }

    async fn fetch(&self) -> Result<Vec<Item>> {
        info!("Searching GitHub repositories: {}", self.url);

        let raw = self
            .context
            .transport
            .get_json(&self.url, &[("Accept", GITHUB_API_ACCEPT)], self.context.timeout)
            .await?;
        let response: SearchResponse = decode(&self.id, raw)?;

        let mut issues = Vec::new();
        for (index, repo) in response.items.iter().enumerate() {
            if !repo.html_url.trim().is_empty() {
                check_absolute_url(&format!("items[{}].html_url", index), &repo.html_url, &mut issues);
            }
        }
        if !issues.is_empty() {
            return Err(validation_failed(&self.id, issues));
        }

        let items = response
            .items
            .into_iter()
            .map(|repo| {
                let description = repo
                    .description
                    .filter(|d| !d.trim().is_empty())
                    .unwrap_or_else(|| "No description".to_string());
                Item {
                    description: Some(description),
                    stars: Some(repo.stargazers_count),
                    date: parse_date(&repo.pushed_at),
                    priority: self.priority,
                    ..Item::new(repo.name, repo.html_url, "GitHub")
                }
            })
            .collect();

        let items = finish(items, self.limit);
        info!("Pulled {} repositories from GitHub ({})", items.len(), self.id);
        Ok(items)
    }
}
