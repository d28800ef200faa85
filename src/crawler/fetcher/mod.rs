//! Page fetching
//!
//! This module handles retrieving page HTML for the crawler, including:
//! - The `Fetcher` trait shared by the HTTP and headless browser backends
//! - Selecting a backend from configuration
//! - Retry logic with a fixed delay and a thin-body check
//! - Error classification

mod browser;
mod http;

pub use browser::BrowserFetcher;
pub use http::{build_http_client, HttpFetcher};

use crate::config::{CrawlerConfig, FetcherBackend, FetcherConfig};
use crate::crawler::rate_limit::DomainRateLimiter;
use crate::ScoutError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Errors from a single fetch attempt
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned a thin body ({len} bytes)")]
    ThinBody { url: String, len: usize },

    #[error("browser failed on {url}: {message}")]
    Browser { url: String, message: String },

    #[error("fetcher is closed")]
    Closed,
}

impl FetchError {
    /// Whether another attempt may succeed
    ///
    /// Client errors other than 408 and 429 are final, as is a closed fetcher.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Status { status, .. } => {
                !(400..500).contains(status) || *status == 408 || *status == 429
            }
            FetchError::Closed => false,
            _ => true,
        }
    }
}

/// Retrieves the HTML of one URL in a single attempt
///
/// Implementations are shared by every URL task of a domain crawl.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetches the page at `url` and returns its HTML
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;

    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Releases backend resources; later fetches fail with `FetchError::Closed`
    async fn close(&self) {}
}

/// Creates the backend selected by `config.backend`
///
/// # Errors
///
/// Returns an error when the backend cannot be started (HTTP client
/// construction failure, Chrome missing or failing to launch). The caller
/// treats this as fatal for one domain only.
pub async fn build_fetcher(
    config: &FetcherConfig,
    timeout: Duration,
) -> Result<Arc<dyn Fetcher>, ScoutError> {
    match config.backend {
        FetcherBackend::Http => Ok(Arc::new(HttpFetcher::new(config, timeout)?)),
        FetcherBackend::Browser => Ok(Arc::new(BrowserFetcher::launch(config, timeout).await?)),
    }
}

/// A fetched page
#[derive(Debug, Clone)]
pub struct PageRecord {
    pub url: Url,
    pub html: String,
    pub retrieved_at: DateTime<Utc>,
}

impl PageRecord {
    pub fn new(url: Url, html: String) -> Self {
        Self {
            url,
            html,
            retrieved_at: Utc::now(),
        }
    }
}

/// How often and how patiently a URL is retried
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Pause between attempts
    pub delay: Duration,

    /// Bodies shorter than this are treated as a failed attempt
    pub min_body_length: usize,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: config.retry_delay(),
            min_body_length: config.min_body_length,
        }
    }

    /// Total number of attempts
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&CrawlerConfig::default())
    }
}

/// Fetches a URL, retrying transient failures
///
/// Every attempt, retries included, waits for the domain's request quota.
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Network error / timeout | Retry after `delay` |
/// | HTTP 5xx, 408, 429 | Retry after `delay` |
/// | Body shorter than `min_body_length` | Retry after `delay` |
/// | Other HTTP 4xx | Give up |
/// | Fetcher closed | Give up |
///
/// # Returns
///
/// * `Some(PageRecord)` - The page was fetched
/// * `None` - Every attempt failed; the failure is logged
pub async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &Url,
    policy: &RetryPolicy,
    limiter: &DomainRateLimiter,
) -> Option<PageRecord> {
    let attempts = policy.attempts();

    for attempt in 1..=attempts {
        limiter.until_ready().await;

        let result = fetcher.fetch(url).await.and_then(|html| {
            if html.len() < policy.min_body_length {
                Err(FetchError::ThinBody {
                    url: url.to_string(),
                    len: html.len(),
                })
            } else {
                Ok(html)
            }
        });

        match result {
            Ok(html) => return Some(PageRecord::new(url.clone(), html)),
            Err(e) if !e.is_retryable() => {
                tracing::warn!(url = %url, error = %e, "Fetch failed");
                return None;
            }
            Err(e) if attempt == attempts => {
                tracing::warn!(url = %url, attempts, error = %e, "Giving up after retries");
                return None;
            }
            Err(e) => {
                tracing::debug!(
                    url = %url,
                    attempt,
                    backend = fetcher.name(),
                    error = %e,
                    "Fetch attempt failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
            }
        }
    }

    None
}
