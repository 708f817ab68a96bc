//! Outbound URI rewriting.
//!
//! Paths are joined on their escaped form as received; nothing is
//! decoded or re-encoded on the way through.

use axum::http::Uri;

use crate::error::RoutingError;
use crate::routing::upstream::Upstream;

/// Point `uri` at `upstream`, keeping the request path and query.
pub fn rewrite_uri(uri: &mut Uri, upstream: &Upstream) -> Result<(), RoutingError> {
    let path = single_joining_slash(upstream.base_path(), uri.path());
    let query = join_query(upstream.base_query().unwrap_or(""), uri.query().unwrap_or(""));

    let path_and_query = if query.is_empty() {
        path
    } else {
        format!("{path}?{query}")
    };

    *uri = Uri::builder()
        .scheme(upstream.scheme())
        .authority(upstream.authority())
        .path_and_query(path_and_query)
        .build()
        .map_err(|e| RoutingError::InvalidTarget(e.to_string()))?;
    Ok(())
}

/// Join two path segments with exactly one slash between them.
pub fn single_joining_slash(a: &str, b: &str) -> String {
    let a_slash = a.ends_with('/');
    let b_slash = b.starts_with('/');
    match (a_slash, b_slash) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{a}/{b}"),
        _ => format!("{a}{b}"),
    }
}

/// Upstream base query first, then the request query.
pub fn join_query(base: &str, request: &str) -> String {
    if base.is_empty() || request.is_empty() {
        format!("{base}{request}")
    } else {
        format!("{base}&{request}")
    }
}
