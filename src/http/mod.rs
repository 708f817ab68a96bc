//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, route dispatch)
//!     → request.rs (request context, body buffering)
//!     → [pipeline directs the request]
//!     → forward.rs (upstream call)
//!     → response.rs (script rewrite)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forward, UpstreamForwarder};
pub use request::{buffer_body, RequestContext};
pub use response::{ScriptBodyRewriter, SCRIPT_UPSTREAM_HOSTS};
pub use server::{build_router, HttpServer};
