//! Request handling and transformation.
//!
//! # Responsibilities
//! - Extract routing-relevant information (declared host)
//! - Hold the mutable per-request state the director works on
//! - Buffer the request body and assemble the outbound request
//!
//! # Design Decisions
//! - A context is owned by exactly one request task and dropped with it
//! - The body is buffered (bounded) so the forwarder sends an exact length

use axum::{
    body::{Body, Bytes},
    http::{header, request::Parts, HeaderMap, Method, Request, Uri, Version},
};

use crate::error::GatewayError;

/// Mutable state of one in-flight request.
#[derive(Debug)]
pub struct RequestContext {
    pub method: Method,
    pub uri: Uri,
    pub version: Version,
    pub headers: HeaderMap,
    /// Transport-reported peer address, `ip:port` or `[ipv6]:port`.
    pub remote_addr: String,
}

impl RequestContext {
    /// Capture the request head and peer address.
    pub fn new(parts: Parts, remote_addr: impl Into<String>) -> Self {
        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            remote_addr: remote_addr.into(),
        }
    }

    /// The declared host: `Host` header, else the URI authority (HTTP/2).
    pub fn declared_host(&self) -> Option<String> {
        self.headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string)
            .or_else(|| self.uri.authority().map(|a| a.as_str().to_string()))
    }

    /// Assemble the outbound request around an already buffered body.
    pub fn into_request(self, body: Bytes) -> Request<Bytes> {
        let mut request = Request::new(body);
        *request.method_mut() = self.method;
        *request.uri_mut() = self.uri;
        *request.version_mut() = self.version;
        *request.headers_mut() = self.headers;
        request
    }
}

/// Read a request body into memory, up to `limit` bytes.
pub async fn buffer_body(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(|e| GatewayError::RequestBody(e.to_string()))
}
