//! Rate-limited manifest fetching with retry.
//!
//! One fetch at a time, a fixed politeness delay after every request
//! regardless of outcome, and a bounded linear-backoff retry loop. A
//! failed fetch never aborts the run: it resolves to `None` and the
//! caller records it in the checkpoint.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ImportConfig;

/// Seam between the pipeline and the network. Tests substitute canned
/// responses through this trait.
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    /// GET a URL and decode the body as JSON. `None` after retries are
    /// exhausted or the body does not decode.
    async fn fetch_json(&self, url: &str) -> Option<Value>;

    /// GET a URL as text (used by the HTML-scrape discovery strategy).
    async fn fetch_text(&self, url: &str) -> Option<String>;
}

/// Reqwest-backed fetcher with a fixed identifying user agent.
pub struct HttpFetcher {
    client: reqwest::Client,
    retries: u32,
    retry_backoff: Duration,
    request_delay: Duration,
}

impl HttpFetcher {
    pub fn new(config: &ImportConfig) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout())
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            retries: config.retries.max(1),
            retry_backoff: config.retry_backoff(),
            request_delay: config.request_delay(),
        }
    }

    async fn get_with_retry(&self, url: &str) -> Option<String> {
        let mut outcome = None;

        for attempt in 1..=self.retries {
            match self.client.get(url).send().await {
                Ok(response) if response.status().is_success() => {
                    match response.text().await {
                        Ok(body) => {
                            outcome = Some(body);
                            break;
                        }
                        Err(e) => debug!("Body read failed for {url}: {e}"),
                    }
                }
                Ok(response) => {
                    debug!("HTTP {} for {url}", response.status());
                }
                Err(e) => {
                    debug!("Request error for {url}: {e}");
                }
            }
            if attempt < self.retries {
                tokio::time::sleep(self.retry_backoff * attempt).await;
            }
        }

        // Politeness throttle: static, not adaptive, applied even on failure.
        tokio::time::sleep(self.request_delay).await;

        if outcome.is_none() {
            warn!("Failed to fetch {url} after {} attempts", self.retries);
        }
        outcome
    }
}

#[async_trait]
impl ManifestFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Option<Value> {
        let body = self.get_with_retry(url).await?;
        match serde_json::from_str(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Response from {url} is not valid JSON: {e}");
                None
            }
        }
    }

    async fn fetch_text(&self, url: &str) -> Option<String> {
        self.get_with_retry(url).await
    }
}
