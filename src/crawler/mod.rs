//! Crawler module for discovering product pages
//!
//! This module contains the core crawling logic, including:
//! - Page fetching over HTTP or a headless browser, with retry logic
//! - HTML link extraction
//! - Structural content scoring
//! - Per-domain rate limiting
//! - The per-domain crawl loop and cross-domain orchestration

mod classifier;
mod controller;
mod fetcher;
mod orchestrator;
mod parser;
mod rate_limit;

pub use classifier::{ClassificationScore, ContentClassifier};
pub use controller::{CrawlContext, DomainCrawler};
pub use fetcher::{
    build_fetcher, build_http_client, fetch_with_retry, BrowserFetcher, FetchError, Fetcher,
    HttpFetcher, PageRecord, RetryPolicy,
};
pub use orchestrator::{start_crawl, CrawlOrchestrator, JobHandle};
pub use parser::{extract_document_links, extract_links};
pub use rate_limit::DomainRateLimiter;
