use crate::UrlError;
use url::Url;

/// Turns a requested domain into the root URL a crawl is seeded with
///
/// # Normalization Steps
///
/// 1. Trim surrounding whitespace and trailing slashes; reject if empty
/// 2. Default the scheme to `https://` when none is given
/// 3. Parse the URL; reject if malformed
/// 4. Only HTTP and HTTPS are accepted
/// 5. The URL must carry a host
/// 6. Drop any fragment
///
/// Paths are kept, so `example.com/shop` seeds the crawl at `/shop`.
///
/// # Arguments
///
/// * `domain` - The domain or URL as requested by the caller
///
/// # Returns
///
/// * `Ok(Url)` - The root URL
/// * `Err(UrlError)` - The input cannot be crawled
///
/// # Examples
///
/// ```
/// use shopscout::url::normalize_root;
///
/// let url = normalize_root("example.com").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/");
///
/// let url = normalize_root("http://shop.example.com/").unwrap();
/// assert_eq!(url.as_str(), "http://shop.example.com/");
/// ```
pub fn normalize_root(domain: &str) -> Result<Url, UrlError> {
    let trimmed = domain.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Returns the lower-cased path of a URL, the form the pattern tables see
pub fn lowercase_path(url: &Url) -> String {
    url.path().to_lowercase()
}

/// Returns the lower-cased path plus `?query` when a query is present
pub fn lowercase_path_and_query(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query).to_lowercase(),
        None => lowercase_path(url),
    }
}
