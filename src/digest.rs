use crate::registry::Collected;
use crate::types::{ContentCategory, Item, Priority};
use tracing::debug;

/// Maximum number of articles in the rendered context.
pub const ARTICLE_BUDGET: usize = 10;

/// Maximum number of discussions in the rendered context.
pub const DISCUSSION_LIMIT: usize = 10;

/// Collected items partitioned by content category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedItems {
    pub news: Vec<Item>,
    pub repos: Vec<Item>,
    pub discussions: Vec<Item>,
    pub articles: Vec<Item>,
}

impl GroupedItems {
    pub fn get(&self, category: ContentCategory) -> &[Item] {
        match category {
            ContentCategory::News => &self.news,
            ContentCategory::Repos => &self.repos,
            ContentCategory::Discussions => &self.discussions,
            ContentCategory::Articles => &self.articles,
        }
    }

    fn get_mut(&mut self, category: ContentCategory) -> &mut Vec<Item> {
        match category {
            ContentCategory::News => &mut self.news,
            ContentCategory::Repos => &mut self.repos,
            ContentCategory::Discussions => &mut self.discussions,
            ContentCategory::Articles => &mut self.articles,
        }
    }

    pub fn len(&self) -> usize {
        ContentCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition collected items by the static category of the resource that
/// produced them, in registration order.
pub fn group_by_category(collected: &Collected) -> GroupedItems {
    let mut grouped = GroupedItems::default();

    for resource in &collected.resources {
        if let Some(items) = collected.results.get(&resource.id) {
            grouped.get_mut(resource.category).extend(items.iter().cloned());
        }
    }

    debug!(
        "Grouped items: {} news, {} repos, {} discussions, {} articles",
        grouped.news.len(),
        grouped.repos.len(),
        grouped.discussions.len(),
        grouped.articles.len()
    );
    grouped
}

/// Select up to `budget` articles. Priority strictly dominates score: levels
/// are consumed from 5 down to 1, each sorted by score descending, and lower
/// levels are only consulted while the budget has room.
pub fn rank_articles(articles: &[Item], budget: usize) -> Vec<Item> {
    let mut selected: Vec<Item> = Vec::with_capacity(budget.min(articles.len()));

    for priority in Priority::descending() {
        let needed = budget - selected.len();
        if needed == 0 {
            break;
        }

        let mut level: Vec<Item> = articles
            .iter()
            .filter(|a| a.priority == priority)
            .cloned()
            .collect();
        level.sort_by(|a, b| b.score.unwrap_or(0).cmp(&a.score.unwrap_or(0)));
        level.truncate(needed);

        selected.extend(level);
    }

    selected
}

/// Newest discussions first, capped at `limit`.
pub fn rank_discussions(discussions: &[Item], limit: usize) -> Vec<Item> {
    let mut ranked = discussions.to_vec();
    ranked.sort_by(|a, b| b.date.cmp(&a.date));
    ranked.truncate(limit);
    ranked
}

/// Apply each category's ordering policy. News and repos keep fetch order.
pub fn rank_sections(grouped: &GroupedItems) -> GroupedItems {
    GroupedItems {
        news: grouped.news.clone(),
        repos: grouped.repos.clone(),
        discussions: rank_discussions(&grouped.discussions, DISCUSSION_LIMIT),
        articles: rank_articles(&grouped.articles, ARTICLE_BUDGET),
    }
}
