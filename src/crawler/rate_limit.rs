//! Per-domain request pacing
//!
//! Each domain crawl owns one `DomainRateLimiter`, shared by its URL tasks
//! through an `Arc`. Two limits apply:
//! - a cap on URLs being fetched at once (tokio semaphore)
//! - a request frequency quota (governor) checked before every attempt,
//!   when configured

use crate::config::CrawlerConfig;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tracing::{debug_span, Instrument};

/// Frequency and concurrency limits for one domain
pub struct DomainRateLimiter {
    limiter: Option<DefaultDirectRateLimiter>,
    semaphore: Arc<Semaphore>,
}

impl DomainRateLimiter {
    /// Creates a limiter allowing `requests_per_second` (if any) and at most
    /// `max_concurrent` requests in flight
    pub fn new(requests_per_second: Option<u32>, max_concurrent: usize) -> Self {
        let limiter = requests_per_second
            .and_then(NonZeroU32::new)
            .map(|rate| RateLimiter::direct(Quota::per_second(rate)));

        Self {
            limiter,
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self::new(
            config.requests_per_second,
            config.max_concurrent_requests as usize,
        )
    }

    /// Waits for a free request slot
    ///
    /// The returned permit holds the slot until dropped; a URL keeps it
    /// across all of its fetch attempts.
    pub async fn acquire_slot(&self) -> Result<OwnedSemaphorePermit, AcquireError> {
        if self.available_slots() == 0 {
            tracing::trace!("All request slots busy, waiting");
        }
        self.semaphore.clone().acquire_owned().await
    }

    /// Waits until the frequency quota allows one more request
    ///
    /// Called before every attempt, retries included.
    pub async fn until_ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().instrument(debug_span!("limiter")).await;
        }
    }

    /// Number of request slots currently free
    pub fn available_slots(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn is_throttled(&self) -> bool {
        self.limiter.is_some()
    }
}
