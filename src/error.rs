//! Per-request error types.
//!
//! # Responsibilities
//! - Describe routing failures (malformed or unknown host)
//! - Describe forwarding failures (timeout, transport error)
//! - Map every request-scoped failure to a gateway status code
//!
//! # Design Decisions
//! - Nothing here terminates the process; configuration errors live in `config`
//! - Upstream failures surface as 502/504 instead of a dropped connection

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure to pick or build a destination for a request.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The declared host could not be reduced to a hostname.
    #[error("malformed host {host:?}: {reason}")]
    MalformedHost { host: String, reason: String },

    /// No upstream is configured for the hostname.
    #[error("no upstream configured for host {0:?}")]
    UnknownHost(String),

    /// The rewritten destination is not a valid URI.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(String),
}

/// Failure of the forwarding primitive.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("upstream timed out")]
    Timeout,

    #[error("upstream request failed: {0}")]
    Request(#[from] hyper_util::client::legacy::Error),

    #[error("upstream TLS setup failed: {0}")]
    Tls(#[from] rustls::Error),
}

/// Any failure that ends a request before an upstream response is relayed.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Routing(#[from] RoutingError),

    #[error("failed to read request body: {0}")]
    RequestBody(String),

    #[error("failed to read upstream response body: {0}")]
    BodyRead(String),

    #[error(transparent)]
    Forward(#[from] ForwardError),
}

impl GatewayError {
    /// Status code returned to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Routing(_) => StatusCode::BAD_GATEWAY,
            GatewayError::RequestBody(_) => StatusCode::BAD_REQUEST,
            GatewayError::BodyRead(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Forward(ForwardError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Forward(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let message = match &self {
            GatewayError::Routing(_) => "No matching upstream",
            GatewayError::RequestBody(_) => "Invalid request body",
            GatewayError::BodyRead(_) => "Upstream response could not be read",
            GatewayError::Forward(ForwardError::Timeout) => "Upstream timed out",
            GatewayError::Forward(_) => "Upstream request failed",
        };
        (self.status(), message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_failures_are_bad_gateway() {
        let err = GatewayError::from(RoutingError::UnknownHost("nope.com".into()));
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);

        let err = GatewayError::from(RoutingError::MalformedHost {
            host: "a:b:c".into(),
            reason: "too many colons".into(),
        });
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn timeout_is_gateway_timeout() {
        let err = GatewayError::Forward(ForwardError::Timeout);
        assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn body_read_is_bad_gateway() {
        let err = GatewayError::BodyRead("length limit exceeded".into());
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
