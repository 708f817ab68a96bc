//! keytiles-proxy
//!
//! Serves the keytiles tracking script and API under the operator's own
//! hostnames.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ /tracking/* ──▶ ScriptHandler ─┐
//!                        │                                            │
//!                        └──────────▶ everything else ─▶ ApiHandler ──┤
//!                                                                     ▼
//!                              RequestPipeline: HostRouter → rewrite_uri
//!                                  → anonymize_ip → filter_headers
//!                                                                     │
//!     Client Response                                                 ▼
//!     ◀────────────── [script: ScriptBodyRewriter] ◀── UpstreamForwarder ──▶ keytiles
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use keytiles_proxy::config::{load_config, ConfigOverrides};
use keytiles_proxy::lifecycle::{spawn_signal_listener, Shutdown};
use keytiles_proxy::observability::{init_logging, init_metrics};
use keytiles_proxy::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "keytiles-proxy", version)]
#[command(about = "Reverse proxy serving keytiles tracking under your own hostnames", long_about = None)]
struct Cli {
    /// Optional TOML config file
    #[arg(short, long, env = "KT_PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen on 0.0.0.0:<port>
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// The two public hostnames, comma separated
    #[arg(long, env = "HOSTS", value_delimiter = ',')]
    hosts: Vec<String>,

    /// Script upstream URL
    #[arg(long, env = "KT_SCRIPT_HOST")]
    script_upstream: Option<String>,

    /// API upstream URLs, one per public hostname, comma separated
    #[arg(long, env = "KT_API_HOSTS", value_delimiter = ',')]
    api_upstreams: Vec<String>,

    /// Extra headers forwarded upstream, comma separated
    #[arg(long, env = "WHITELIST_HEADERS", value_delimiter = ',')]
    whitelist_headers: Vec<String>,

    #[arg(long, env = "TLS_CERT")]
    tls_cert: Option<PathBuf>,

    #[arg(long, env = "CERT_KEY")]
    tls_key: Option<PathBuf>,

    /// Enables the Prometheus endpoint on this address
    #[arg(long, env = "METRICS_ADDRESS")]
    metrics_address: Option<String>,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            port: self.port,
            hosts: self.hosts.clone(),
            script_upstream: self.script_upstream.clone(),
            api_upstreams: self.api_upstreams.clone(),
            whitelist_headers: self.whitelist_headers.clone(),
            tls_cert: self.tls_cert.clone(),
            tls_key: self.tls_key.clone(),
            metrics_address: self.metrics_address.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json);

    tracing::info!("keytiles-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match load_config(cli.config.as_deref(), cli.overrides()) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        hosts = ?config.hosts,
        script_upstream = %config.upstreams.script,
        api_upstreams = ?config.upstreams.api,
        tls = config.listener.tls.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_listener(shutdown.clone());

    let server = match HttpServer::new(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build server");
            std::process::exit(1);
        }
    };
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
