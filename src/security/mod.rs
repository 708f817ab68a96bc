//! Privacy subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound request:
//!     → anonymize.rs (mask client IP, set X-Forwarded-For)
//!     → headers.rs (drop everything outside the whitelist)
//!     → Pass to forwarder
//!
//! Inbound response:
//!     → headers.rs (strip hop-by-hop headers)
//! ```
//!
//! # Design Decisions
//! - No trust in client input: X-Forwarded-For is always overwritten
//! - Whitelist, not blacklist: unknown headers never leak upstream

pub mod anonymize;
pub mod headers;

pub use anonymize::{anonymize_ip, mask_ip};
pub use headers::{filter_headers, strip_hop_by_hop, Whitelist, X_FORWARDED_FOR};
