use crate::config::types::{ClassifierConfig, Config, CrawlerConfig, FetcherConfig, PatternConfig};
use crate::url::UrlPatternMatcher;
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_classifier_config(&config.classifier)?;
    validate_patterns(&config.patterns)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages_per_domain == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages_per_domain must be >= 1 when set".to_string(),
        ));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.requests_per_second == Some(0) {
        return Err(ConfigError::Validation(
            "requests_per_second must be >= 1 when set".to_string(),
        ));
    }

    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_requests must be between 1 and 100, got {}",
            config.max_concurrent_requests
        )));
    }

    Ok(())
}

/// Validates fetch backend configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in &config.headers {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(ConfigError::Validation(format!(
                "Invalid header name '{}'",
                name
            )));
        }

        if value.chars().any(|c| c.is_control()) {
            return Err(ConfigError::Validation(format!(
                "Header '{}' contains control characters",
                name
            )));
        }
    }

    Ok(())
}

/// Validates classifier thresholds
fn validate_classifier_config(config: &ClassifierConfig) -> Result<(), ConfigError> {
    if config.product_link_divisor < 1 {
        return Err(ConfigError::Validation(
            "product_link_divisor must be >= 1".to_string(),
        ));
    }

    if config.high_threshold == 0 || config.mid_threshold == 0 || config.low_threshold == 0 {
        return Err(ConfigError::Validation(format!(
            "classifier thresholds must be >= 1, got high={} mid={} low={}",
            config.high_threshold, config.mid_threshold, config.low_threshold
        )));
    }

    Ok(())
}

/// Validates pattern overrides by compiling them
fn validate_patterns(config: &PatternConfig) -> Result<(), ConfigError> {
    UrlPatternMatcher::new(config).map(|_| ())
}
