//! URL canonicalization and scope checks.

use url::Url;

/// Error type for URL canonicalization failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Canonicalize a URL string for consistent cache keys.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative references against `base` when one is given
/// 3. Lowercase the host
/// 4. Remove fragment (#...)
/// 5. Keep query string intact (do not reorder)
pub fn canonicalize(input: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match base {
        Some(base) => base.join(trimmed),
        None => Url::parse(trimmed),
    }
    .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlError::UnsupportedScheme(scheme.to_string())),
    }

    if let Some(host) = parsed.host_str() {
        let host = host.to_lowercase();
        parsed
            .set_host(Some(&host))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether two URLs share scheme, host and port.
pub fn same_origin(a: &Url, b: &Url) -> bool {
    a.origin() == b.origin()
}

/// Whether the URL host contains any of the given substrings.
pub fn host_matches_any(url: &Url, hosts: &[String]) -> bool {
    url.host_str()
        .is_some_and(|host| hosts.iter().any(|bypass| host.contains(bypass.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://bar.example/app/").unwrap()
    }

    #[test]
    fn test_canonicalize_basic() {
        let url = canonicalize("https://example.com", None).unwrap();
        assert_eq!(url.scheme(), "https");
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_relative_to_base() {
        let url = canonicalize("main.dart.js", Some(&base())).unwrap();
        assert_eq!(url.as_str(), "https://bar.example/app/main.dart.js");
    }

    #[test]
    fn test_canonicalize_absolute_ignores_base() {
        let url = canonicalize("https://other.example/x.js", Some(&base())).unwrap();
        assert_eq!(url.as_str(), "https://other.example/x.js");
    }

    #[test]
    fn test_canonicalize_relative_without_base() {
        let result = canonicalize("main.dart.js", None);
        assert!(matches!(result, Err(UrlError::InvalidUrl(_))));
    }

    #[test]
    fn test_canonicalize_lowercase_host() {
        let url = canonicalize("https://EXAMPLE.COM", None).unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
    }

    #[test]
    fn test_canonicalize_remove_fragment() {
        let url = canonicalize("https://example.com/index.html#/stock", None).unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.path(), "/index.html");
    }

    #[test]
    fn test_canonicalize_preserve_query() {
        let url = canonicalize("https://example.com?a=1&b=2", None).unwrap();
        assert_eq!(url.query(), Some("a=1&b=2"));
    }

    #[test]
    fn test_canonicalize_trim_whitespace() {
        let url = canonicalize("  https://example.com  ", None).unwrap();
        assert_eq!(url.as_str(), "https://example.com/");
    }

    #[test]
    fn test_canonicalize_unsupported_scheme() {
        let result = canonicalize("file:///etc/passwd", None);
        assert!(matches!(result, Err(UrlError::UnsupportedScheme(_))));
    }

    #[test]
    fn test_canonicalize_empty() {
        assert!(matches!(canonicalize("", None), Err(UrlError::Empty)));
        assert!(matches!(canonicalize("   ", None), Err(UrlError::Empty)));
    }

    #[test]
    fn test_same_origin() {
        let a = Url::parse("https://bar.example/app/index.html").unwrap();
        assert!(same_origin(&a, &base()));
        assert!(!same_origin(&Url::parse("http://bar.example/").unwrap(), &base()));
        assert!(!same_origin(&Url::parse("https://bar.example:8443/").unwrap(), &base()));
        assert!(!same_origin(&Url::parse("https://cdn.example/").unwrap(), &base()));
    }

    #[test]
    fn test_host_matches_any() {
        let hosts = vec!["firebaseio.com".to_string(), "gstatic.com".to_string()];
        assert!(host_matches_any(&Url::parse("https://barstock-default-rtdb.firebaseio.com/x").unwrap(), &hosts));
        assert!(host_matches_any(&Url::parse("https://fonts.gstatic.com/s/roboto.woff2").unwrap(), &hosts));
        assert!(!host_matches_any(&Url::parse("https://bar.example/").unwrap(), &hosts));
        assert!(!host_matches_any(&Url::parse("https://bar.example/").unwrap(), &[]));
    }
}
