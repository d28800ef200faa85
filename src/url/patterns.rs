//! URL pattern tables used to pre-classify pages before their content is scored
//!
//! Every table is matched against the lower-cased path; the exclusion table
//! also sees the query string so that `/search?q=...` style pages are caught.

use crate::config::PatternConfig;
use crate::url::normalize::{lowercase_path, lowercase_path_and_query};
use crate::ConfigError;
use regex::RegexSet;
use url::Url;

/// Paths that are never product pages: basket, account, editorial and policy pages
pub const DEFAULT_EXCLUDE_PATTERNS: &[&str] = &[
    r"/cart(?:[/?._-]|$)",
    r"/basket(?:[/?._-]|$)",
    r"/checkout",
    r"/account",
    r"/login",
    r"/logout",
    r"/register",
    r"/sign-?(?:in|up)(?:[/?._-]|$)",
    r"/wishlist",
    r"/compare",
    r"/search(?:[/?._-]|$)",
    r"/tags?/",
    r"/blogs?(?:[/?._-]|$)",
    r"/about(?:[/?._-]|$)",
    r"/contact(?:[/?._-]|$)",
    r"/faqs?(?:[/?._-]|$)",
    r"/help(?:[/?._-]|$)",
    r"/support(?:[/?._-]|$)",
    r"/careers?(?:[/?._-]|$)",
    r"/press(?:[/?._-]|$)",
    r"/privacy",
    r"/terms(?:[/?._-]|$)",
    r"/shipping(?:[/?._-]|$)",
    r"/returns?(?:[/?._-]|$)",
    r"/profile(?:[/?._-]|$)",
    r"/orders?(?:[/?._-]|$)",
    r"/payments?/[^/]+/?$",
    r"shopping-faq",
];

/// Paths that look like a single product detail page
pub const DEFAULT_PRODUCT_PATTERNS: &[&str] = &[
    r"/products?/[^/]+/?$",
    r"/items?/[^/]+/?$",
    r"/p/[^/]+/?$",
    r"/pd/[^/]+/?$",
    r"/detail/[^/]+/?$",
    r"/dp/[a-z0-9]{10}(?:/|$)",
    r"/-pr-[^/]+/?$",
    r"/[^/]+/[^/]+\d+\.html$",
    r"/productdetail/[^/]+/?$",
    r"/product-detail/[^/]+/?$",
    r".+/p-mp\d+$",
    r".+/p/\d+$",
    r"^/products/.+",
];

/// Paths that look like listing, category or landing pages
pub const DEFAULT_COLLECTION_PATTERNS: &[&str] = &[
    r"/collections?(?:/|$)",
    r"/category/",
    r"/categories/",
    r"/shop/",
    r"/catalog/",
    r"/c/",
    r"/(?:men|mens|women|womens|kids|boys|girls|unisex)(?:/|$)",
    r"/sale(?:/|$)",
    r"/new-arrivals?(?:/|$)",
];

/// Category a URL falls into based on its path alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlCategory {
    /// Matched an exclusion pattern; never a product page
    Excluded,
    /// Matched a product pattern
    ProductCandidate,
    /// Matched a collection pattern
    CollectionCandidate,
    /// Matched nothing
    Unknown,
}

impl UrlCategory {
    /// Returns true if the URL looked like a product page
    pub fn is_product_candidate(&self) -> bool {
        matches!(self, Self::ProductCandidate)
    }

    /// Returns true if the URL must not be processed further
    pub fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded)
    }
}

/// Compiled pattern tables
///
/// The matcher holds no mutable state, so one instance is shared by every
/// domain of a job.
#[derive(Debug, Clone)]
pub struct UrlPatternMatcher {
    exclude: RegexSet,
    product: RegexSet,
    collection: RegexSet,
}

impl UrlPatternMatcher {
    /// Compiles the pattern tables described by `config`
    ///
    /// Tables that are not overridden fall back to the built-in defaults;
    /// `extra-exclude` patterns are appended to the exclusion table.
    ///
    /// # Returns
    ///
    /// * `Ok(UrlPatternMatcher)` - All patterns compiled
    /// * `Err(ConfigError)` - A pattern is not a valid regular expression
    pub fn new(config: &PatternConfig) -> Result<Self, ConfigError> {
        let mut exclude = table_or_default(&config.exclude, DEFAULT_EXCLUDE_PATTERNS);
        exclude.extend(config.extra_exclude.iter().cloned());

        let product = table_or_default(&config.product, DEFAULT_PRODUCT_PATTERNS);
        let collection = table_or_default(&config.collection, DEFAULT_COLLECTION_PATTERNS);

        Ok(Self {
            exclude: compile_table(&exclude)?,
            product: compile_table(&product)?,
            collection: compile_table(&collection)?,
        })
    }

    /// Classifies a URL
    ///
    /// Exclusion takes precedence over everything, then product patterns,
    /// then collection patterns.
    ///
    /// # Examples
    ///
    /// ```
    /// use shopscout::url::{UrlCategory, UrlPatternMatcher};
    /// use url::Url;
    ///
    /// let matcher = UrlPatternMatcher::default();
    /// let url = Url::parse("https://shop.example/products/linen-shirt").unwrap();
    /// assert_eq!(matcher.classify(&url), UrlCategory::ProductCandidate);
    ///
    /// let url = Url::parse("https://shop.example/cart").unwrap();
    /// assert_eq!(matcher.classify(&url), UrlCategory::Excluded);
    /// ```
    pub fn classify(&self, url: &Url) -> UrlCategory {
        if self.exclude.is_match(&lowercase_path_and_query(url)) {
            return UrlCategory::Excluded;
        }

        let path = lowercase_path(url);
        if self.product.is_match(&path) {
            UrlCategory::ProductCandidate
        } else if self.collection.is_match(&path) {
            UrlCategory::CollectionCandidate
        } else {
            UrlCategory::Unknown
        }
    }

    /// Checks the product table alone, ignoring exclusions
    pub fn matches_product(&self, url: &Url) -> bool {
        self.product.is_match(&lowercase_path(url))
    }
}

impl Default for UrlPatternMatcher {
    fn default() -> Self {
        Self::new(&PatternConfig::default()).expect("built-in URL patterns compile")
    }
}

fn table_or_default(table: &Option<Vec<String>>, default: &[&str]) -> Vec<String> {
    match table {
        Some(patterns) => patterns.clone(),
        None => default.iter().map(|p| p.to_string()).collect(),
    }
}

/// Compiles a table, reporting the first pattern that fails
pub(crate) fn compile_table(patterns: &[String]) -> Result<RegexSet, ConfigError> {
    RegexSet::new(patterns).map_err(|e| {
        let pattern = patterns
            .iter()
            .find(|p| regex::Regex::new(p).is_err())
            .cloned()
            .unwrap_or_default();
        ConfigError::InvalidPattern {
            pattern,
            message: e.to_string(),
        }
    })
}
