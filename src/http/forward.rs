//! The forwarding primitive.
//!
//! # Responsibilities
//! - Send a fully directed request to its upstream
//! - Relay the upstream response (status, headers, streamed body)
//!
//! # Design Decisions
//! - The pipeline depends on the `Forward` trait only, so tests can record
//!   outbound requests without a network
//! - Redirects are never followed; they are the client's business
//! - Timeouts belong to the forwarder, not to the pipeline; the upstream
//!   timeout covers the response head, the request timeout layer the rest

use std::future::Future;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{Request, Response, Version},
};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::TimeoutConfig;
use crate::error::ForwardError;
use crate::security::strip_hop_by_hop;

/// Performs the upstream call for a directed request.
pub trait Forward: Send + Sync + 'static {
    fn forward(
        &self,
        request: Request<Bytes>,
    ) -> impl Future<Output = Result<Response<Body>, ForwardError>> + Send;
}

/// Forwarder used in production.
///
/// The hyper client sends exactly the headers it is given plus `Host`, so
/// the whitelist is what the upstream sees.
#[derive(Clone)]
pub struct UpstreamForwarder {
    client: Client<HttpsConnector<HttpConnector>, Body>,
    upstream_timeout: Duration,
}

impl UpstreamForwarder {
    /// Build a forwarder honouring the configured timeouts.
    pub fn new(timeouts: &TimeoutConfig) -> Result<Self, ForwardError> {
        let mut http = HttpConnector::new();
        http.enforce_http(false);
        http.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));

        let https = HttpsConnectorBuilder::new()
            .with_provider_and_webpki_roots(rustls::crypto::ring::default_provider())?
            .https_or_http()
            .enable_http1()
            .wrap_connector(http);

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build(https),
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }
}

impl Forward for UpstreamForwarder {
    async fn forward(&self, request: Request<Bytes>) -> Result<Response<Body>, ForwardError> {
        let uri = request.uri().clone();
        let mut request = request.map(Body::from);
        // upstream connections are HTTP/1.1 whatever the client spoke
        *request.version_mut() = Version::HTTP_11;

        let upstream = tokio::time::timeout(self.upstream_timeout, self.client.request(request))
            .await
            .map_err(|_| ForwardError::Timeout)??;

        let (mut parts, body) = upstream.into_parts();
        strip_hop_by_hop(&mut parts.headers);

        tracing::debug!(
            status = %parts.status,
            url = %uri,
            "Upstream responded"
        );

        Ok(Response::from_parts(parts, Body::new(body)))
    }
}
