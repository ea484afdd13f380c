use crate::fetcher::HttpTransport;
use crate::sources::{
    DevToSource, FetchContext, GitHubSearchSource, HackerNewsSource, RedditSource, RssFeedSource,
};
use crate::traits::Resource;
use crate::types::{
    ContentCategory, Item, NewsletterError, Priority, ResourceConfig, ResourceKind, Result,
};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// Static description of a registered resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceInfo {
    pub id: String,
    pub category: ContentCategory,
    pub priority: Priority,
}

/// Outcome of one collection pass. Every registered id appears in `results`;
/// failed ids map to an empty list and have their error in `errors`.
#[derive(Debug, Default)]
pub struct Collected {
    pub results: HashMap<String, Vec<Item>>,
    pub errors: HashMap<String, NewsletterError>,
    pub resources: Vec<ResourceInfo>,
}

impl Collected {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// `(id, message)` for every failed resource, in registration order.
    pub fn failures(&self) -> Vec<(String, String)> {
        self.resources
            .iter()
            .filter_map(|r| self.errors.get(&r.id).map(|e| (r.id.clone(), e.to_string())))
            .collect()
    }

    pub fn item_count(&self) -> usize {
        self.results.values().map(Vec::len).sum()
    }
}

/// Owns the configured resources of one run and collects from them concurrently.
pub struct ResourceRegistry {
    resources: Vec<Box<dyn Resource>>,
    context: FetchContext,
}

impl std::fmt::Debug for ResourceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceRegistry")
            .field("resources", &self.resources.iter().map(|r| r.id()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ResourceRegistry {
    pub fn new(transport: Arc<dyn HttpTransport>, timeout: Duration) -> Self {
        Self {
            resources: Vec::new(),
            context: FetchContext::new(transport, timeout),
        }
    }

    /// Build the adapter matching `config` and register it.
    ///
    /// `json` sources are told apart by id prefix: `hn…` is Hacker News,
    /// `devto-…` is DEV.to.
    pub fn register(&mut self, config: &ResourceConfig) -> Result<&mut Self> {
        let context = self.context.clone();
        let resource: Box<dyn Resource> = match config.kind {
            ResourceKind::Rss => Box::new(RssFeedSource::new(config, context)),
            ResourceKind::Atom => Box::new(RedditSource::new(config, context)),
            ResourceKind::Github => Box::new(GitHubSearchSource::new(config, context)),
            ResourceKind::Json if config.id.starts_with("hn") => {
                Box::new(HackerNewsSource::new(config, context))
            }
            ResourceKind::Json if config.id.starts_with("devto-") => {
                Box::new(DevToSource::new(config, context))
            }
            ResourceKind::Json | ResourceKind::Custom => {
                return Err(NewsletterError::UnsupportedSource {
                    id: config.id.clone(),
                    kind: config.kind,
                })
            }
        };

        self.add(resource)
    }

    /// Register an already-built resource, e.g. a custom adapter.
    pub fn add(&mut self, resource: Box<dyn Resource>) -> Result<&mut Self> {
        if self.resources.iter().any(|r| r.id() == resource.id()) {
            return Err(NewsletterError::Config(format!(
                "Duplicate resource id: {}",
                resource.id()
            )));
        }

        info!(
            "Registered resource {} ({}, priority {})",
            resource.id(),
            resource.category(),
            resource.priority()
        );
        self.resources.push(resource);
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn resource_infos(&self) -> Vec<ResourceInfo> {
        self.resources
            .iter()
            .map(|r| ResourceInfo {
                id: r.id().to_string(),
                category: r.category(),
                priority: r.priority(),
            })
            .collect()
    }

    /// Fetch every resource concurrently and wait for all of them to settle.
    /// One resource failing never affects the others.
    pub async fn collect(&self) -> Collected {
        info!("Collecting from {} resources", self.resources.len());

        let outcomes = join_all(self.resources.iter().map(|r| r.fetch())).await;

        let mut collected = Collected {
            resources: self.resource_infos(),
            ..Default::default()
        };

        for (resource, outcome) in self.resources.iter().zip(outcomes) {
            let id = resource.id().to_string();
            match outcome {
                Ok(items) => {
                    collected.results.insert(id, items);
                }
                Err(e) => {
                    error!("Resource {} failed: {}", id, e);
                    collected.results.insert(id.clone(), Vec::new());
                    collected.errors.insert(id, e);
                }
            }
        }

        info!(
            "Collected {} items ({} of {} resources failed)",
            collected.item_count(),
            collected.errors.len(),
            self.resources.len()
        );
        collected
    }
}
