//! Output handler traits
//!
//! This module defines the interfaces through which a crawl job reports to
//! the outside world: a sink receiving the final result, and a hook notified
//! of every job status transition.

use crate::state::{CrawlJob, CrawlResult};
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to write output: {0}")]
    Write(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Receives the result of a finished job
///
/// Called exactly once per job, before the job is marked completed.
/// Implementations must be thread-safe.
#[async_trait]
pub trait ResultSink: Send + Sync {
    /// Delivers the final result of `job`
    async fn deliver(&self, job: &CrawlJob, result: &CrawlResult) -> OutputResult<()>;
}

/// Observes job status transitions
///
/// Called once when the job starts running and once when it completes.
#[async_trait]
pub trait StatusHook: Send + Sync {
    async fn on_status(&self, job: &CrawlJob);
}
