//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, Host)
//!     → router.rs (route class from path, upstream from host)
//!     → host.rs (canonical hostname)
//!     → upstream.rs (UpstreamMap lookup)
//!     → rewrite.rs (scheme/authority/path/query rewrite)
//!
//! Map Compilation (at startup):
//!     hosts[] + upstream URLs[]
//!     → Canonicalize hostnames
//!     → Freeze as immutable UpstreamMap
//! ```
//!
//! # Design Decisions
//! - Upstreams compiled at startup, immutable at runtime
//! - Exactly two route classes selected by a fixed path prefix
//! - Deterministic: same host always resolves to the same upstream

pub mod host;
pub mod rewrite;
pub mod router;
pub mod upstream;

pub use host::extract_hostname;
pub use rewrite::{rewrite_uri, single_joining_slash};
pub use router::{HostRouter, RouteClass, SCRIPT_PATH_PREFIX};
pub use upstream::{Upstream, UpstreamMap};
