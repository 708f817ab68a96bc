//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Request handlers and the director produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached by the HTTP layer and shows up in trace spans
//! - Metrics are opt-in; logging is always on

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{init_metrics, record_request};
