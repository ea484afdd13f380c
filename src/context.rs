use crate::digest::GroupedItems;
use crate::types::Item;
use crate::utils::format_thousands;
use chrono::NaiveDate;

/// Render ranked sections into the context block handed to the LLM.
///
/// Every section is always present, with a fallback line when empty, in the
/// order news, repos, discussions, articles. Output depends only on the
/// arguments.
pub fn render_context(sections: &GroupedItems, current_date: NaiveDate, topic: &str) -> String {
    [
        format!("Current Date: {}", current_date.format("%B %-d, %Y")),
        String::new(),
        format!("Recent {} Projects:\n{}", topic, render_news(&sections.news, topic)),
        String::new(),
        format!("Trending {} Repositories:\n{}", topic, render_repos(&sections.repos)),
        String::new(),
        format!("Community Discussions:\n{}", render_discussions(&sections.discussions)),
        String::new(),
        format!("Articles & Tutorials:\n{}", render_articles(&sections.articles)),
    ]
    .join("\n")
}

fn or_fallback(lines: Vec<String>, fallback: String) -> String {
    if lines.is_empty() {
        fallback
    } else {
        lines.join("\n")
    }
}

fn short_date(item: &Item) -> String {
    item.date
        .map(|d| format!(" ({})", d.format("%b %-d")))
        .unwrap_or_default()
}

fn render_news(items: &[Item], topic: &str) -> String {
    let lines = items
        .iter()
        .map(|i| format!("- [{}]({})", i.title, i.url))
        .collect();
    or_fallback(lines, format!("- No recent {} news available", topic))
}

fn render_repos(items: &[Item]) -> String {
    let lines = items
        .iter()
        .enumerate()
        .map(|(idx, r)| {
            let stars = match r.stars {
                Some(stars) if stars > 0 => format!(" (⭐ {})", format_thousands(stars)),
                _ => String::new(),
            };
            format!(
                "{}. **[{}]({})** - {}{}",
                idx + 1,
                r.title,
                r.url,
                r.description.as_deref().unwrap_or("No description"),
                stars
            )
        })
        .collect();
    or_fallback(lines, "- No trending repositories available".to_string())
}

fn render_discussions(items: &[Item]) -> String {
    let lines = items
        .iter()
        .enumerate()
        .map(|(idx, p)| format!("{}. **[{}]({})** - {}{}", idx + 1, p.title, p.url, p.source, short_date(p)))
        .collect();
    or_fallback(lines, "- No significant community discussions this week".to_string())
}

fn render_articles(items: &[Item]) -> String {
    let lines = items
        .iter()
        .enumerate()
        .map(|(idx, a)| {
            let mut stats = Vec::new();
            if let Some(score) = a.score.filter(|s| *s != 0) {
                stats.push(format!("❤️ {}", score));
            }
            if let Some(comments) = a.comments.filter(|c| *c != 0) {
                stats.push(format!("💬 {}", comments));
            }

            let mut line = format!(
                "{}. **[{}]({})** - {}{}",
                idx + 1,
                a.title,
                a.url,
                a.source,
                short_date(a)
            );
            if !stats.is_empty() {
                line.push_str(" | ");
                line.push_str(&stats.join(", "));
            }
            if let Some(tags) = a.description.as_deref().filter(|t| !t.is_empty()) {
                line.push_str("\n   ");
                line.push_str(tags);
            }
            line
        })
        .collect();
    or_fallback(lines, "- No recent articles available".to_string())
}
