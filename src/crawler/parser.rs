//! HTML link extraction
//!
//! This module parses fetched HTML and returns the links a domain crawl may
//! follow next:
//! - Only `<a href>` tags are considered
//! - Links are resolved against the page URL and stripped of fragments
//! - Only links on the same host and port as the page are kept

use crate::url::same_authority;
use scraper::{Html, Selector};
use url::Url;

/// Extracts followable same-host links from an HTML page
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags, relative or absolute, including protocol-relative
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Non-HTTP(S) URLs and links to other hosts
///
/// The result keeps document order and may contain duplicates; the caller's
/// visited set deduplicates.
///
/// # Example
///
/// ```
/// use shopscout::crawler::extract_links;
/// use url::Url;
///
/// let html = r#"<a href="/p/kettle#reviews">Kettle</a><a href="https://elsewhere.com/">Out</a>"#;
/// let base_url = Url::parse("https://shop.example/").unwrap();
/// let links = extract_links(html, &base_url);
/// assert_eq!(links.len(), 1);
/// assert_eq!(links[0].as_str(), "https://shop.example/p/kettle");
/// ```
pub fn extract_links(html: &str, base_url: &Url) -> Vec<Url> {
    let document = Html::parse_document(html);
    extract_document_links(&document, base_url)
}

/// Same as [`extract_links`], over an already parsed document
pub fn extract_document_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let Ok(a_selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&a_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .filter(|url| same_authority(url, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub(crate) fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let mut absolute_url = base_url.join(href).ok()?;
    if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
        return None;
    }

    absolute_url.set_fragment(None);
    Some(absolute_url)
}
