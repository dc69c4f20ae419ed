//! Request identity used as the cache key.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the cache key for a request.
///
/// The fragment never reaches the server, so two URLs that differ only in
/// their fragment share an entry. The method is upper-cased.
pub fn compute_request_key(method: &str, url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(normalized.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_key_stability() {
        let key1 = compute_request_key("GET", &url("https://example.com/main.dart.js"));
        let key2 = compute_request_key("GET", &url("https://example.com/main.dart.js"));
        assert_eq!(key1, key2);
    }

    #[test]
    fn test_key_ignores_fragment() {
        let plain = compute_request_key("GET", &url("https://example.com/index.html"));
        let fragment = compute_request_key("GET", &url("https://example.com/index.html#/stock"));
        assert_eq!(plain, fragment);
    }

    #[test]
    fn test_key_method_case_insensitive() {
        let upper = compute_request_key("GET", &url("https://example.com/"));
        let lower = compute_request_key("get", &url("https://example.com/"));
        assert_eq!(upper, lower);
    }

    #[test]
    fn test_key_different_method() {
        let get = compute_request_key("GET", &url("https://example.com/"));
        let head = compute_request_key("HEAD", &url("https://example.com/"));
        assert_ne!(get, head);
    }

    #[test]
    fn test_key_keeps_query() {
        let a = compute_request_key("GET", &url("https://example.com/main.dart.js?v=1"));
        let b = compute_request_key("GET", &url("https://example.com/main.dart.js?v=2"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = compute_request_key("GET", &url("https://example.com/"));
        assert_eq!(key.len(), 64);
        assert!(key.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
