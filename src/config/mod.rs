//! Configuration module for Shopscout
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; an empty file yields the default configuration.
//!
//! # Example
//!
//! ```no_run
//! use shopscout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("shopscout.toml")).unwrap();
//! println!("Fetch backend: {}", config.fetcher.backend);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserOptions, ClassifierConfig, Config, CrawlerConfig, FetcherBackend, FetcherConfig,
    PatternConfig, SignalWeights, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
