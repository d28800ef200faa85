//! URL handling module for Shopscout
//!
//! This module provides root normalization for requested domains, host
//! comparison, and the pattern tables that pre-classify URLs as product,
//! collection or excluded pages.

mod domain;
mod normalize;
mod patterns;

// Re-export main functions
pub use domain::same_authority;
pub use normalize::{lowercase_path, lowercase_path_and_query, normalize_root};
pub use patterns::{
    UrlCategory, UrlPatternMatcher, DEFAULT_COLLECTION_PATTERNS, DEFAULT_EXCLUDE_PATTERNS,
    DEFAULT_PRODUCT_PATTERNS,
};

pub(crate) use patterns::compile_table;
