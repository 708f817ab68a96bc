//! Script route handler.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
};

use crate::error::GatewayError;
use crate::http::forward::Forward;
use crate::http::request::{buffer_body, RequestContext};
use crate::http::response::ScriptBodyRewriter;
use crate::pipeline::RequestPipeline;

/// Serves the tracking script, rebranded with the public hostnames.
pub struct ScriptHandler<F> {
    pipeline: RequestPipeline,
    forwarder: Arc<F>,
    rewriter: ScriptBodyRewriter,
    max_request_body: usize,
}

impl<F: Forward> ScriptHandler<F> {
    pub fn new(
        pipeline: RequestPipeline,
        forwarder: Arc<F>,
        rewriter: ScriptBodyRewriter,
        max_request_body: usize,
    ) -> Self {
        Self {
            pipeline,
            forwarder,
            rewriter,
            max_request_body,
        }
    }

    /// Direct, forward, rewrite and relay one request.
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
                "Could not route script request"
            );
            return Err(e.into());
        }

        let body = buffer_body(body, self.max_request_body).await?;
        let upstream = ctx.uri.clone();
        tracing::info!(upstream = %upstream, "Fetching script upstream");

        let response = self
            .forwarder
            .forward(ctx.into_request(body))
            .await
            .inspect_err(|e| tracing::error!(upstream = %upstream, error = %e, "Upstream request failed"))?;

        self.rewriter.rewrite(response).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to rewrite script response");
        })
    }
}
