//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with one catch-all handler
//! - Dispatch each request to the script or API handler by path
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Serve plain HTTP or TLS with graceful shutdown
//! - Record per-request metrics

use std::net::SocketAddr;
use std::path::Path;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use axum_server::Handle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, GatewayConfig};
use crate::http::forward::{Forward, UpstreamForwarder};
use crate::lifecycle::shutdown;
use crate::net::load_tls_config;
use crate::observability::metrics;
use crate::pipeline::Handlers;
use crate::routing::RouteClass;

/// Time in-flight TLS connections get to finish after shutdown.
const TLS_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Application state injected into the handler.
pub struct AppState<F> {
    pub handlers: Handlers<F>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            handlers: self.handlers.clone(),
        }
    }
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server with the production forwarder.
    pub fn new(config: GatewayConfig) -> Result<Self, ConfigError> {
        let forwarder = UpstreamForwarder::new(&config.timeouts)?;
        let handlers = Handlers::from_config(&config, forwarder)?;
        let router = build_router(&config, handlers);
        Ok(Self { router, config })
    }

    /// Run the server until `shutdown` fires.
    ///
    /// Serves TLS when the configuration carries a certificate pair.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        match &self.config.listener.tls {
            Some(tls) => {
                let rustls = load_tls_config(Path::new(&tls.cert_path), Path::new(&tls.key_path))
                    .await
                    .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

                let handle = Handle::new();
                let drain = handle.clone();
                tokio::spawn(async move {
                    shutdown::wait(shutdown).await;
                    drain.graceful_shutdown(Some(TLS_DRAIN_TIMEOUT));
                });

                tracing::info!(address = %addr, "HTTPS server starting");
                axum_server::from_tcp_rustls(listener.into_std()?, rustls)
                    .handle(handle)
                    .serve(app)
                    .await?;
            }
            None => {
                tracing::info!(address = %addr, "HTTP server starting");
                axum::serve(listener, app)
                    .with_graceful_shutdown(shutdown::wait(shutdown))
                    .await?;
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router<F: Forward>(config: &GatewayConfig, handlers: Handlers<F>) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(RequestBodyLimitLayer::new(config.limits.max_request_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)));

    Router::new()
        .route("/", any(proxy_handler::<F>))
        .route("/{*path}", any(proxy_handler::<F>))
        .with_state(AppState { handlers })
        .layer(middleware)
}

/// Main proxy handler.
/// Picks the route class, runs the matching handler and records the outcome.
async fn proxy_handler<F: Forward>(
    State(state): State<AppState<F>>,
    request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let route = RouteClass::of(request.uri().path());
    let method = request.method().to_string();
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_default();

    let result = match route {
        RouteClass::Script => state.handlers.script.handle(request, &remote_addr).await,
        RouteClass::Api => state.handlers.api.handle(request, &remote_addr).await,
    };

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!(route = route.as_str(), status = %e.status(), "Request failed");
            e.into_response()
        }
    };

    metrics::record_request(route.as_str(), &method, response.status().as_u16(), start);
    response
}
