use url::Url;

/// Checks whether two URLs point at the same host and port
///
/// Hosts compare case-insensitively. Subdomains are distinct hosts:
/// `shop.example.com` and `example.com` are not the same authority.
pub fn same_authority(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(ha), Some(hb)) => {
            ha.eq_ignore_ascii_case(hb) && a.port_or_known_default() == b.port_or_known_default()
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_authority() {
        assert!(same_authority(
            &url("https://example.com/a"),
            &url("https://EXAMPLE.com/b?c=d")
        ));
    }

    #[test]
    fn test_explicit_default_port_is_same_authority() {
        assert!(same_authority(
            &url("https://example.com:443/"),
            &url("https://example.com/")
        ));
    }

    #[test]
    fn test_subdomain_is_different() {
        assert!(!same_authority(
            &url("https://example.com/"),
            &url("https://blog.example.com/")
        ));
    }

    #[test]
    fn test_different_port_is_different() {
        assert!(!same_authority(
            &url("http://127.0.0.1:8080/"),
            &url("http://127.0.0.1:9090/")
        ));
    }

    #[test]
    fn test_hostless_url() {
        assert!(!same_authority(
            &url("mailto:someone@example.com"),
            &url("https://example.com/")
        ));
    }
}
