//! Request transformation pipeline.
//!
//! # Data Flow
//! ```text
//! RequestContext (uri, headers, remote addr)
//!     → HostRouter (declared host → upstream)
//!     → rewrite_uri (scheme/authority/path/query)
//!     → anonymize_ip (X-Forwarded-For := masked client IP)
//!     → filter_headers (whitelist)
//!     → Forward (upstream call)
//!     → [script route] ScriptBodyRewriter
//! ```
//!
//! # Design Decisions
//! - Both route handlers share the same director; only the script handler
//!   touches the response
//! - Handlers are built once from the validated config and shared via `Arc`
//! - The forwarder is injected, so the whole pipeline runs without a network

pub mod api;
pub mod script;

use std::sync::Arc;

use axum::http::HeaderValue;

use crate::config::validation::validate_config;
use crate::config::{ConfigError, GatewayConfig, ValidationError};
use crate::error::RoutingError;
use crate::http::forward::Forward;
use crate::http::request::RequestContext;
use crate::http::response::ScriptBodyRewriter;
use crate::routing::{rewrite_uri, HostRouter, Upstream, UpstreamMap};
use crate::security::{anonymize_ip, filter_headers, Whitelist, X_FORWARDED_FOR};

pub use api::ApiHandler;
pub use script::ScriptHandler;

/// The director shared by both route handlers.
#[derive(Debug, Clone)]
pub struct RequestPipeline {
    router: HostRouter,
    whitelist: Arc<Whitelist>,
}

impl RequestPipeline {
    pub fn new(router: HostRouter, whitelist: Arc<Whitelist>) -> Self {
        Self { router, whitelist }
    }

    /// Point the request at its upstream and scrub it for forwarding.
    ///
    /// On error the context is left untouched.
    pub fn direct(&self, ctx: &mut RequestContext) -> Result<(), RoutingError> {
        // 1. Resolve upstream from the declared host
        let host = ctx.declared_host();
        let upstream = self.router.route(host.as_deref())?;

        // 2. Rewrite destination
        rewrite_uri(&mut ctx.uri, upstream)?;

        // 3. Anonymize client IP, overwriting whatever the client sent
        let ip = anonymize_ip(&ctx.headers, &ctx.remote_addr);
        let value = HeaderValue::from_str(&ip).unwrap_or_else(|_| HeaderValue::from_static(""));
        ctx.headers.insert(X_FORWARDED_FOR, value);

        // 4. Forward whitelisted headers only
        filter_headers(&mut ctx.headers, &self.whitelist);

        tracing::debug!(upstream = %ctx.uri, "Request directed");
        Ok(())
    }
}

fn parse_upstream(role: &'static str, url: &str) -> Result<Upstream, ConfigError> {
    Upstream::parse(url).map_err(|reason| {
        ConfigError::Validation(vec![ValidationError::InvalidUpstream {
            role,
            url: url.to_string(),
            reason,
        }])
    })
}

/// Both route handlers, sharing one forwarder.
pub struct Handlers<F> {
    pub api: Arc<ApiHandler<F>>,
    pub script: Arc<ScriptHandler<F>>,
}

impl<F> Clone for Handlers<F> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            script: Arc::clone(&self.script),
        }
    }
}

impl<F: Forward> Handlers<F> {
    /// Build both handlers from a configuration.
    ///
    /// The configuration is validated again here, so a handler set can never
    /// be built from a config that skipped `load_config`.
    pub fn from_config(config: &GatewayConfig, forwarder: F) -> Result<Self, ConfigError> {
        validate_config(config).map_err(ConfigError::Validation)?;

        let (first, second) = (config.hosts[0].as_str(), config.hosts[1].as_str());
        let script_upstream = parse_upstream("script", &config.upstreams.script)?;
        let api_upstreams = config
            .upstreams
            .api
            .iter()
            .map(|url| parse_upstream("api", url))
            .collect::<Result<Vec<_>, _>>()?;

        let api_map =
            UpstreamMap::build(config.hosts.iter().map(String::as_str).zip(api_upstreams))?;
        // every public hostname serves the same script
        let script_map = UpstreamMap::build(
            config
                .hosts
                .iter()
                .map(|h| (h.as_str(), script_upstream.clone())),
        )?;

        let whitelist = Arc::new(Whitelist::new(config.headers.whitelist.as_slice()));
        let forwarder = Arc::new(forwarder);
        let max_request_body = config.limits.max_request_body_bytes;

        let api = ApiHandler::new(
            RequestPipeline::new(HostRouter::new(api_map), Arc::clone(&whitelist)),
            Arc::clone(&forwarder),
            max_request_body,
        );
        let script = ScriptHandler::new(
            RequestPipeline::new(
                HostRouter::with_fallback(script_map, script_upstream),
                whitelist,
            ),
            forwarder,
            ScriptBodyRewriter::new([first, second], config.limits.max_script_body_bytes),
            max_request_body,
        );

        Ok(Self {
            api: Arc::new(api),
            script: Arc::new(script),
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory forwarder recording what would have been sent upstream.

    use std::sync::{Arc, Mutex};

    use axum::{
        body::{Body, Bytes},
        http::{Request, Response, StatusCode},
    };

    use crate::error::ForwardError;
    use crate::http::forward::Forward;

    #[derive(Clone)]
    pub struct RecordingForwarder {
        pub seen: Arc<Mutex<Vec<Request<Bytes>>>>,
        status: StatusCode,
        body: &'static str,
    }

    impl RecordingForwarder {
        pub fn new(status: StatusCode, body: &'static str) -> Self {
            Self {
                seen: Arc::new(Mutex::new(Vec::new())),
                status,
                body,
            }
        }

        pub fn requests(&self) -> Vec<Request<Bytes>> {
            self.seen.lock().unwrap().drain(..).collect()
        }
    }

    impl Forward for RecordingForwarder {
        async fn forward(&self, request: Request<Bytes>) -> Result<Response<Body>, ForwardError> {
            self.seen.lock().unwrap().push(request);
            Ok(Response::builder()
                .status(self.status)
                .header("content-type", "application/javascript;charset=utf-8")
                .header("content-length", self.body.len())
                .body(Body::from(self.body))
                .unwrap())
        }
    }
}
