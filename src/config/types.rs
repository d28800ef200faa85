use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default user agent presented by both fetch backends
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Main configuration structure for Shopscout
///
/// Every section is optional in the TOML file; missing sections and keys take
/// their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetcher: FetcherConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub patterns: PatternConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages visited per domain (unbounded when absent)
    #[serde(rename = "max-pages-per-domain")]
    pub max_pages_per_domain: Option<u32>,

    /// Timeout applied to every single fetch attempt (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Number of retries after the first failed attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Fixed delay between attempts (milliseconds)
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Bodies shorter than this are treated as failed fetches
    #[serde(rename = "min-body-length")]
    pub min_body_length: usize,

    /// Requests per second allowed per domain (unlimited when absent)
    #[serde(rename = "requests-per-second")]
    pub requests_per_second: Option<u32>,

    /// Maximum number of in-flight fetches per domain
    #[serde(rename = "max-concurrent-requests")]
    pub max_concurrent_requests: u32,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages_per_domain: None,
            request_timeout_ms: 10_000,
            max_retries: 3,
            retry_delay_ms: 2_000,
            min_body_length: 100,
            requests_per_second: Some(5),
            max_concurrent_requests: 8,
        }
    }
}

impl CrawlerConfig {
    /// The per-attempt fetch timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// The delay between fetch attempts
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Which fetch backend a domain crawl uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherBackend {
    /// Plain HTTP client; fast, does not run page scripts
    #[default]
    Http,
    /// Headless Chrome; slow, renders JavaScript catalogs
    Browser,
}

impl FromStr for FetcherBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "browser" => Ok(Self::Browser),
            other => Err(format!(
                "unknown fetcher backend '{}', expected 'http' or 'browser'",
                other
            )),
        }
    }
}

impl fmt::Display for FetcherBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::Browser => write!(f, "browser"),
        }
    }
}

/// Fetch backend configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Backend selected for every domain of a job
    pub backend: FetcherBackend,

    /// User agent sent by either backend
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Extra request headers (HTTP backend only)
    pub headers: BTreeMap<String, String>,

    /// Headless browser settings
    pub browser: BrowserOptions,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        let headers = [
            (
                "Accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            ),
            ("Accept-Language", "en-US,en;q=0.5"),
            ("Upgrade-Insecure-Requests", "1"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            backend: FetcherBackend::Http,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers,
            browser: BrowserOptions::default(),
        }
    }
}

/// Headless browser settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserOptions {
    /// Run Chrome without a window
    pub headless: bool,

    /// Path to the Chrome executable (auto-detected when absent)
    pub executable: Option<String>,

    /// Extra command-line switches passed to Chrome
    pub args: Vec<String>,

    /// Time to let scripts settle after the load event (milliseconds)
    #[serde(rename = "settle-ms")]
    pub settle_ms: u64,

    /// Hide `navigator.webdriver` from page scripts
    #[serde(rename = "hide-webdriver")]
    pub hide_webdriver: bool,
}

impl Default for BrowserOptions {
    fn default() -> Self {
        Self {
            headless: true,
            executable: None,
            args: vec![
                "--disable-dev-shm-usage".to_string(),
                "--disable-blink-features=AutomationControlled".to_string(),
                "--window-size=1920,1080".to_string(),
                "--disable-notifications".to_string(),
            ],
            settle_ms: 2_000,
            hide_webdriver: true,
        }
    }
}

/// Content classifier thresholds and weights
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Product score that wins outright when it beats the collection score
    #[serde(rename = "high-threshold")]
    pub high_threshold: u32,

    /// Product score that wins when it is at least twice the collection score
    #[serde(rename = "mid-threshold")]
    pub mid_threshold: u32,

    /// Product score that suffices for URLs matching a product pattern
    #[serde(rename = "low-threshold")]
    pub low_threshold: u32,

    /// Only score pages whose URL matches a product pattern
    #[serde(rename = "require-product-url")]
    pub require_product_url: bool,

    /// Product links on a page above this count add to the collection score
    #[serde(rename = "product-link-threshold")]
    pub product_link_threshold: u32,

    /// Divisor turning the product link count into a collection bonus
    #[serde(rename = "product-link-divisor")]
    pub product_link_divisor: u32,

    pub weights: SignalWeights,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            high_threshold: 7,
            mid_threshold: 5,
            low_threshold: 5,
            require_product_url: false,
            product_link_threshold: 5,
            product_link_divisor: 5,
            weights: SignalWeights::default(),
        }
    }
}

/// Weight contributed by each signal group when it matches
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SignalWeights {
    pub add_to_cart: u32,
    pub variant_selector: u32,
    pub delivery_check: u32,
    pub payment_offers: u32,
    pub shipping_info: u32,
    pub product_details: u32,
    pub price: u32,
    pub reviews: u32,
    pub gallery: u32,
    pub product_schema: u32,
    pub wishlist: u32,
    pub stock_status: u32,
    pub product_grid: u32,
    pub filters: u32,
    pub pagination: u32,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            add_to_cart: 3,
            variant_selector: 3,
            delivery_check: 3,
            payment_offers: 1,
            shipping_info: 1,
            product_details: 1,
            price: 2,
            reviews: 1,
            gallery: 1,
            product_schema: 4,
            wishlist: 1,
            stock_status: 1,
            product_grid: 2,
            filters: 2,
            pagination: 2,
        }
    }
}

/// Overrides for the URL pattern tables
///
/// A table left unset uses the built-in defaults; setting it replaces the
/// defaults entirely.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PatternConfig {
    pub product: Option<Vec<String>>,
    pub collection: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,

    /// Appended to the exclusion table without replacing it
    #[serde(rename = "extra-exclude")]
    pub extra_exclude: Vec<String>,
}
