//! API route handler.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
};

use crate::error::GatewayError;
use crate::http::forward::Forward;
use crate::http::request::{buffer_body, RequestContext};
use crate::pipeline::RequestPipeline;

/// Directs API traffic to the upstream of the declared host.
pub struct ApiHandler<F> {
    pipeline: RequestPipeline,
    forwarder: Arc<F>,
    max_request_body: usize,
}

impl<F: Forward> ApiHandler<F> {
    pub fn new(pipeline: RequestPipeline, forwarder: Arc<F>, max_request_body: usize) -> Self {
        Self {
            pipeline,
            forwarder,
            max_request_body,
        }
    }

    /// Direct, forward and relay one request.
    pub async fn handle(
        &self,
        request: Request<Body>,
        remote_addr: &str,
    ) -> Result<Response<Body>, GatewayError> {
        let (parts, body) = request.into_parts();
        let mut ctx = RequestContext::new(parts, remote_addr);

        if let Err(e) = self.pipeline.direct(&mut ctx) {
            tracing::warn!(
                host = ?ctx.declared_host(),
                error = %e,
                "Could not route API request"
            );
            return Err(e.into());
        }

        let body = buffer_body(body, self.max_request_body).await?;
        let upstream = ctx.uri.clone();
        tracing::info!(upstream = %upstream, "Sending API request upstream");

        let response = self
            .forwarder
            .forward(ctx.into_request(body))
            .await
            .inspect_err(|e| tracing::error!(upstream = %upstream, error = %e, "Upstream request failed"))?;
        Ok(response)
    }
}
