use crate::types::{FetchConfig, NewsletterError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Time-bounded HTTP GET capability shared by every source adapter.
///
/// Implementations perform exactly one request per call and never retry;
/// wrap calls in [`crate::retry::retry_with_backoff`] when retries are wanted.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Fetch `url` and return the body as text.
    ///
    /// Fails with [`NewsletterError::Http`] on a non-success status and with
    /// [`NewsletterError::Timeout`] when no response arrives within `timeout`.
    async fn get_text(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> Result<String>;

    /// Fetch `url` and parse the body as JSON.
    async fn get_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<serde_json::Value> {
        let body = self.get_text(url, headers, timeout).await?;
        serde_json::from_str(&body)
            .map_err(|e| NewsletterError::Parse(format!("Invalid JSON from {}: {}", url, e)))
    }
}

/// reqwest-backed transport.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }
}

#[async_trait]
impl HttpTransport for Fetcher {
    async fn get_text(&self, url: &str, headers: &[(&str, &str)], timeout: Duration) -> Result<String> {
        debug!("GET {} (timeout {:?})", url, timeout);
        let start_time = Instant::now();

        let request = async {
            let mut request = self.client.get(url);
            for (name, value) in headers {
                request = request.header(*name, *value);
            }

            let response = request.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(NewsletterError::Http {
                    status: status.as_u16(),
                    status_text: status.canonical_reason().unwrap_or("Unknown").to_string(),
                    url: url.to_string(),
                });
            }

            Ok::<String, NewsletterError>(response.text().await?)
        };

        // Dropping the request future on expiry cancels the in-flight request
        match tokio::time::timeout(timeout, request).await {
            Ok(Ok(body)) => {
                info!(
                    "Fetched {} ({} bytes in {}ms)",
                    url,
                    body.len(),
                    start_time.elapsed().as_millis()
                );
                Ok(body)
            }
            Ok(Err(e)) => {
                warn!("Request to {} failed: {}", url, e);
                Err(e)
            }
            Err(_) => {
                warn!("Request to {} timed out after {:?}", url, timeout);
                Err(NewsletterError::Timeout {
                    url: url.to_string(),
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }
}
