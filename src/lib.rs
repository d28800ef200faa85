//! Shopscout: a product URL discovery crawler
//!
//! This crate crawls e-commerce domains breadth-first and reports the pages
//! that look like product detail pages, using URL pattern tables followed by
//! structural scoring of the fetched HTML.

pub mod config;
pub mod crawler;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Shopscout operations
#[derive(Debug, Error)]
pub enum ScoutError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser backend error: {0}")]
    Browser(String),

    #[error("Invalid crawl job: {0}")]
    InvalidJob(String),

    #[error("Invalid job status transition: {from:?} -> {to:?}")]
    InvalidJobTransition {
        from: state::JobStatus,
        to: state::JobStatus,
    },

    #[error("Invalid crawl state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlState,
        to: state::CrawlState,
    },

    #[error("Crawl job task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Empty domain")]
    Empty,
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{start_crawl, CrawlOrchestrator, JobHandle};
pub use state::{CrawlJob, CrawlResult, DomainResult, JobStatus};
pub use url::{normalize_root, UrlCategory, UrlPatternMatcher};
