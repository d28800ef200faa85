//! State module for tracking crawl progress
//!
//! This module provides the typed records that flow through a crawl job.
//!
//! # Components
//!
//! - `CrawlState`: Lifecycle of one domain crawl controller
//! - `CrawlJob` / `JobStatus`: A user-initiated job and its status
//! - `DomainResult` / `CrawlResult`: Confirmed product URLs per domain

mod crawl_state;
mod job;

// Re-export main types
pub use crawl_state::CrawlState;
pub use job::{CrawlJob, CrawlResult, DomainResult, JobStatus};
