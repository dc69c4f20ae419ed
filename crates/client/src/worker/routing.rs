//! Fetch routing: which strategy, if any, handles a request.

use barstock_core::Request;

use super::Manifest;
use crate::fetch::{host_matches_any, same_origin};

/// Why a request is left to the default network path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassReason {
    NonGet,
    CrossOrigin,
    BypassHost,
}

/// Strategy chosen for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Not intercepted; the request goes to the network untouched.
    Passthrough(BypassReason),
    /// Navigation: network first, persisted as the offline shell.
    NetworkFirst,
    /// Sub-resource: serve cached, refresh in the background.
    StaleWhileRevalidate,
}

/// Decide how to handle a request. Rules are evaluated in order.
pub fn route(request: &Request, manifest: &Manifest) -> RouteDecision {
    if !request.is_get() {
        return RouteDecision::Passthrough(BypassReason::NonGet);
    }

    if !same_origin(&request.url, &manifest.base_url) {
        return RouteDecision::Passthrough(BypassReason::CrossOrigin);
    }

    if host_matches_any(&request.url, &manifest.bypass_hosts) {
        return RouteDecision::Passthrough(BypassReason::BypassHost);
    }

    if request.is_navigation() { RouteDecision::NetworkFirst } else { RouteDecision::StaleWhileRevalidate }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barstock_core::{AppConfig, RequestMode};
    use url::Url;

    fn manifest(base: &str) -> Manifest {
        Manifest::from_config(&AppConfig { base_url: base.into(), ..Default::default() }).unwrap()
    }

    fn get(url: &str) -> Request {
        Request::get(Url::parse(url).unwrap())
    }

    #[test]
    fn test_non_get_passthrough() {
        let m = manifest("https://bar.example/");
        for method in ["POST", "PUT", "DELETE", "HEAD"] {
            let request = get("https://bar.example/api/stock").with_method(method);
            assert_eq!(route(&request, &m), RouteDecision::Passthrough(BypassReason::NonGet));
        }
    }

    #[test]
    fn test_non_get_checked_before_origin() {
        let m = manifest("https://bar.example/");
        let request = get("https://firestore.googleapis.com/v1/docs").with_method("POST");
        assert_eq!(route(&request, &m), RouteDecision::Passthrough(BypassReason::NonGet));
    }

    #[test]
    fn test_cross_origin_passthrough() {
        let m = manifest("https://bar.example/");
        assert_eq!(
            route(&get("https://cdn.example/lib.js"), &m),
            RouteDecision::Passthrough(BypassReason::CrossOrigin)
        );
        assert_eq!(
            route(&get("http://bar.example/main.dart.js"), &m),
            RouteDecision::Passthrough(BypassReason::CrossOrigin)
        );
    }

    #[test]
    fn test_bypass_host_same_origin() {
        let m = manifest("https://barstock.firebaseio.com/");
        assert_eq!(
            route(&get("https://barstock.firebaseio.com/main.dart.js"), &m),
            RouteDecision::Passthrough(BypassReason::BypassHost)
        );
    }

    #[test]
    fn test_navigation_network_first() {
        let m = manifest("https://bar.example/");
        let request = Request::navigate(Url::parse("https://bar.example/inventory").unwrap());
        assert_eq!(route(&request, &m), RouteDecision::NetworkFirst);
    }

    #[test]
    fn test_subresource_stale_while_revalidate() {
        let m = manifest("https://bar.example/");
        assert_eq!(route(&get("https://bar.example/main.dart.js"), &m), RouteDecision::StaleWhileRevalidate);

        let cors = get("https://bar.example/assets/FontManifest.json").with_mode(RequestMode::Cors);
        assert_eq!(route(&cors, &m), RouteDecision::StaleWhileRevalidate);
    }
}
