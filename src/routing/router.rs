//! Route class selection and host-based upstream lookup.
//!
//! # Responsibilities
//! - Classify a request path as script or API traffic
//! - Resolve the upstream for a declared host
//! - Return an explicit routing error rather than a silent default
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(1) host lookup via HashMap
//! - A fallback upstream is opt-in, per router

use crate::error::RoutingError;
use crate::routing::host::extract_hostname;
use crate::routing::upstream::{Upstream, UpstreamMap};

/// Path prefix served by the script pipeline.
pub const SCRIPT_PATH_PREFIX: &str = "/tracking/";

/// The two route classes the gateway knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Script,
    Api,
}

impl RouteClass {
    /// Classify a request path.
    ///
    /// The bare prefix without its trailing slash counts as script traffic too.
    pub fn of(path: &str) -> Self {
        let bare = SCRIPT_PATH_PREFIX.trim_end_matches('/');
        if path.starts_with(SCRIPT_PATH_PREFIX) || path == bare {
            RouteClass::Script
        } else {
            RouteClass::Api
        }
    }

    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            RouteClass::Script => "script",
            RouteClass::Api => "api",
        }
    }
}

/// Maps a declared host to its upstream.
#[derive(Debug, Clone)]
pub struct HostRouter {
    upstreams: UpstreamMap,
    fallback: Option<Upstream>,
}

impl HostRouter {
    /// A router that fails for hosts missing from `upstreams`.
    pub fn new(upstreams: UpstreamMap) -> Self {
        Self {
            upstreams,
            fallback: None,
        }
    }

    /// A router that answers `fallback` whenever the host cannot be resolved.
    pub fn with_fallback(upstreams: UpstreamMap, fallback: Upstream) -> Self {
        Self {
            upstreams,
            fallback: Some(fallback),
        }
    }

    /// Resolve the upstream for a raw `Host` value.
    pub fn route(&self, host: Option<&str>) -> Result<&Upstream, RoutingError> {
        let resolved = match host {
            Some(host) => {
                extract_hostname(host).and_then(|hostname| self.upstreams.resolve(&hostname))
            }
            None => Err(RoutingError::UnknownHost(String::new())),
        };

        match (resolved, &self.fallback) {
            (Ok(upstream), _) => Ok(upstream),
            (Err(e), Some(fallback)) => {
                tracing::warn!(
                    host = ?host,
                    error = %e,
                    fallback = %fallback,
                    "Host not routable, using fallback upstream"
                );
                Ok(fallback)
            }
            (Err(e), None) => Err(e),
        }
    }
}
