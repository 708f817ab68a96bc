//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! TcpListener (bound by main)
//!     → plain HTTP: axum::serve
//!     → TLS: tls.rs (PEM check, rustls config) → axum-server
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and switched on only when both PEM files are configured
//! - Certificate problems are fatal at startup, never per connection

pub mod tls;

pub use tls::load_tls_config;
