#![allow(dead_code)]

use async_trait::async_trait;
use newsletter_pipeline::{
    HttpTransport, NewsletterConfig, NewsletterError, PromptTemplates, ResourceConfig,
    ResourceKind, Result,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .try_init()
            .ok();
    });
}

pub const RSS_URL: &str = "https://news.example.com/vue/feed.xml";
pub const REDDIT_URL: &str = "https://www.reddit.com/r/vuejs/.rss";
pub const HN_URL: &str = "https://hn.algolia.com/api/v1/search?query=vue&tags=story";
pub const DEVTO_URL: &str = "https://dev.to/api/articles?tag=vue";
pub const GITHUB_URL: &str =
    "https://api.github.com/search/repositories?q=vue+language:vue&sort=stars";

/// Canned outcome for one URL.
#[derive(Debug, Clone)]
pub enum Fixture {
    Body(String),
    Status(u16),
    Timeout,
}

/// In-memory transport keyed by exact URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct FixtureTransport {
    routes: HashMap<String, Fixture>,
    requests: Mutex<Vec<(String, Vec<(String, String)>)>>,
}

impl FixtureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: &str, body: impl Into<String>) -> Self {
        self.routes.insert(url.to_string(), Fixture::Body(body.into()));
        self
    }

    pub fn with_json(self, url: &str, value: &Value) -> Self {
        self.with_body(url, value.to_string())
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(url.to_string(), Fixture::Status(status));
        self
    }

    pub fn with_timeout(mut self, url: &str) -> Self {
        self.routes.insert(url.to_string(), Fixture::Timeout);
        self
    }

    /// `(url, headers)` of every request seen so far.
    pub fn requests(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.requests.lock().unwrap().clone()
    }

    pub fn into_arc(self) -> Arc<dyn HttpTransport> {
        Arc::new(self)
    }
}

#[async_trait]
impl HttpTransport for FixtureTransport {
    async fn get_text(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> Result<String> {
        self.requests.lock().unwrap().push((
            url.to_string(),
            headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ));

        match self.routes.get(url) {
            Some(Fixture::Body(body)) => Ok(body.clone()),
            Some(Fixture::Status(status)) => Err(http_error(url, *status)),
            Some(Fixture::Timeout) => Err(NewsletterError::Timeout {
                url: url.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            }),
            None => Err(http_error(url, 404)),
        }
    }
}

fn http_error(url: &str, status: u16) -> NewsletterError {
    NewsletterError::Http {
        status,
        status_text: reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string(),
        url: url.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Payload builders

/// RSS 2.0 document from `(title, link, pubDate)` triples.
pub fn rss_feed(items: &[(&str, &str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link, pub_date)| {
            format!(
                "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate><guid>{}</guid></item>",
                title, link, pub_date, link
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Vue News</title><link>https://news.example.com</link><description>News</description>{}</channel></rss>"#,
        items
    )
}

/// Atom document from `(title, link, updated)` triples.
pub fn atom_feed(entries: &[(&str, &str, &str)]) -> String {
    let entries: String = entries
        .iter()
        .map(|(title, link, updated)| {
            format!(
                r#"<entry><id>{}</id><title>{}</title><link href="{}"/><updated>{}</updated></entry>"#,
                link, title, link, updated
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><id>https://www.reddit.com/r/vuejs/</id><title>vuejs</title><updated>2026-10-15T12:00:00+00:00</updated>{}</feed>"#,
        entries
    )
}

pub fn hn_story(object_id: &str, title: &str, url: Option<&str>, points: i64) -> Value {
    json!({
        "objectID": object_id,
        "title": title,
        "url": url,
        "points": points,
        "num_comments": points / 2,
        "author": "pg",
        "created_at": "2026-10-14T08:00:00Z"
    })
}

pub fn hn_response(hits: Vec<Value>) -> Value {
    json!({ "hits": hits, "nbHits": hits.len(), "page": 0, "nbPages": 1, "hitsPerPage": 20 })
}

pub fn devto_article(id: i64, title: &str, reactions: i64, tags: &[&str]) -> Value {
    json!({
        "id": id,
        "title": title,
        "url": format!("https://dev.to/someone/article-{}", id),
        "published_at": "2026-10-13T10:00:00Z",
        "public_reactions_count": reactions,
        "comments_count": 3,
        "tag_list": tags,
        "user": { "name": "Someone" }
    })
}

pub fn github_repo(name: &str, stars: u64, description: Option<&str>) -> Value {
    json!({
        "name": name,
        "html_url": format!("https://github.com/vuejs/{}", name),
        "description": description,
        "stargazers_count": stars,
        "pushed_at": "2026-10-12T09:30:00Z"
    })
}

pub fn github_response(items: Vec<Value>) -> Value {
    json!({ "total_count": items.len(), "items": items })
}

// ---------------------------------------------------------------------------
// Happy-path scenario

pub fn happy_path_sources() -> Vec<ResourceConfig> {
    vec![
        ResourceConfig::new("vue-news", ResourceKind::Rss, RSS_URL).with_tag("Vue Blog"),
        ResourceConfig::new("reddit-vue", ResourceKind::Atom, REDDIT_URL).with_tag("vuejs"),
        ResourceConfig::new("hn-vue", ResourceKind::Json, HN_URL),
        ResourceConfig::new("devto-vue", ResourceKind::Json, DEVTO_URL).with_priority(4),
        ResourceConfig::new("github-vue", ResourceKind::Github, GITHUB_URL),
    ]
}

pub fn happy_path_transport() -> FixtureTransport {
    FixtureTransport::new()
        .with_body(
            RSS_URL,
            rss_feed(&[
                ("Vue 3.6 released", "https://news.example.com/vue-3-6", "Tue, 13 Oct 2026 10:00:00 GMT"),
                ("Vite 7 beta", "https://news.example.com/vite-7", "Mon, 12 Oct 2026 09:00:00 GMT"),
            ]),
        )
        .with_body(
            REDDIT_URL,
            atom_feed(&[
                ("Pinia or Vuex in 2026?", "https://www.reddit.com/r/vuejs/comments/abc/pinia/", "2026-10-14T10:00:00+00:00"),
                ("Show off your Nuxt app", "https://www.reddit.com/r/vuejs/comments/def/nuxt/", "2026-10-15T10:00:00+00:00"),
            ]),
        )
        .with_json(
            HN_URL,
            &hn_response(vec![
                hn_story("101", "Vue Vapor mode deep dive", Some("https://blog.example.com/vapor"), 150),
                hn_story("102", "Ask HN: Vue vs React in 2026", None, 80),
            ]),
        )
        .with_json(
            DEVTO_URL,
            &json!([
                devto_article(1, "Composables you should know", 120, &["vue", "javascript"]),
                devto_article(2, "Testing Vue with Vitest", 45, &["vue", "testing"]),
            ]),
        )
        .with_json(
            GITHUB_URL,
            &github_response(vec![
                github_repo("core", 48_213, Some("The progressive JavaScript framework")),
                github_repo("pinia", 13_050, None),
            ]),
        )
}

pub fn prompts() -> PromptTemplates {
    PromptTemplates::new(
        "You are the editor of the Vue.js Weekly Newsletter.\n",
        "Write this week's issue from the data below.\n\n{{CONTEXT_DATA}}\n\nStart with the title.",
    )
}

pub fn happy_path_config() -> NewsletterConfig {
    NewsletterConfig::new(happy_path_sources(), prompts())
}

// ---------------------------------------------------------------------------
// Throwaway HTTP server

/// Minimal HTTP/1.1 server answering every connection with the same
/// response, recording raw requests.
pub struct TestServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl TestServer {
    pub async fn start(status: u16, body: impl Into<String>, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let body: String = body.into();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let body = body.clone();
                let recorded = recorded.clone();
                tokio::spawn(async move {
                    let request = read_request(&mut socket).await;
                    recorded.lock().unwrap().push(request);
                    tokio::time::sleep(delay).await;

                    let response = format!(
                        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        reason_phrase(status),
                        body.len(),
                        body
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = socket.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_string();
            let content_length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= pos + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).to_string()
}
