//! Outbound header whitelisting.
//!
//! # Responsibilities
//! - Hold the set of header names allowed to reach an upstream
//! - Remove every other header from a forwarded request
//!
//! # Design Decisions
//! - Names are normalized to lower case once, when the whitelist is built
//! - `HeaderName` is already lower case, so filtering never re-normalizes
//! - Removal is exhaustive: all values of a rejected header go

use std::collections::HashSet;

use axum::http::{header, HeaderMap, HeaderName};

/// Header carrying the (anonymized) client address.
pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Headers that are always forwarded.
const BASELINE: [&str; 2] = ["content-type", "content-length"];

/// Set of forwardable header names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Whitelist {
    names: HashSet<String>,
}

impl Whitelist {
    /// Build a whitelist from the configured extras.
    ///
    /// Without extras, `x-forwarded-for` is allowed so the upstream can still
    /// build visit sessions from the anonymized address.
    pub fn new<S: AsRef<str>>(extras: &[S]) -> Self {
        let mut names: HashSet<String> = BASELINE.iter().map(|h| h.to_string()).collect();

        let extras: Vec<String> = extras
            .iter()
            .map(|h| h.as_ref().trim().to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        if extras.is_empty() {
            names.insert(X_FORWARDED_FOR.to_string());
        }
        names.extend(extras);

        Self { names }
    }

    /// Whether `name` may be forwarded.
    pub fn allows(&self, name: &HeaderName) -> bool {
        self.names.contains(name.as_str())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for Whitelist {
    fn default() -> Self {
        Self::new::<&str>(&[])
    }
}

/// Remove every header not present in `whitelist`.
pub fn filter_headers(headers: &mut HeaderMap, whitelist: &Whitelist) {
    let rejected: Vec<HeaderName> = headers
        .keys()
        .filter(|name| !whitelist.allows(name))
        .cloned()
        .collect();

    for name in rejected {
        tracing::trace!(header = %name, "Dropping non-whitelisted header");
        headers.remove(&name);
    }
}

/// Hop-by-hop headers never relayed from an upstream response.
static HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Strip hop-by-hop headers from a relayed response.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP.iter() {
        headers.remove(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_default_whitelist() {
        let whitelist = Whitelist::default();
        assert_eq!(whitelist.len(), 3);
        assert!(whitelist.allows(&header::CONTENT_TYPE));
        assert!(whitelist.allows(&header::CONTENT_LENGTH));
        assert!(whitelist.allows(&HeaderName::from_static(X_FORWARDED_FOR)));
    }

    #[test]
    fn test_configured_extras_are_normalized() {
        let whitelist = Whitelist::new(&[" X-Custom-Header ", "", "Accept-Language"]);
        assert!(whitelist.allows(&HeaderName::from_static("x-custom-header")));
        assert!(whitelist.allows(&HeaderName::from_static("accept-language")));
        assert!(whitelist.allows(&header::CONTENT_TYPE));
        assert!(!whitelist.allows(&HeaderName::from_static(X_FORWARDED_FOR)));
    }

    #[test]
    fn test_filter_removes_non_whitelisted() {
        let whitelist = Whitelist::new(&["x-forwarded-for"]);
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("192.168.12.0"));
        headers.insert("x-not-whitelisted-header", HeaderValue::from_static("some-value"));
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        headers.insert("cookie", HeaderValue::from_static("session=1"));

        filter_headers(&mut headers, &whitelist);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("x-forwarded-for").unwrap(), "192.168.12.0");
        assert_eq!(headers.get("content-type").unwrap(), "application/json");
        assert!(headers.get("x-not-whitelisted-header").is_none());
        assert!(headers.get("cookie").is_none());
    }

    #[test]
    fn test_filter_removes_all_values() {
        let whitelist = Whitelist::default();
        let mut headers = HeaderMap::new();
        headers.append("x-multi", HeaderValue::from_static("a"));
        headers.append("x-multi", HeaderValue::from_static("b"));
        headers.append("x-multi", HeaderValue::from_static("c"));

        filter_headers(&mut headers, &whitelist);

        assert!(headers.is_empty());
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        strip_hop_by_hop(&mut headers);

        assert_eq!(headers.len(), 1);
        assert!(headers.contains_key(header::CONTENT_TYPE));
    }
}
