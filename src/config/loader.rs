//! Configuration loading from disk, flags and environment.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::schema::{GatewayConfig, TlsConfig};
use crate::config::validation::{validate_config, ValidationError, REQUIRED_HOSTS};
use crate::error::{ForwardError, RoutingError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error("Routing error: {0}")]
    Routing(#[from] RoutingError),

    #[error("Upstream client error: {0}")]
    Client(#[from] ForwardError),

    #[error("TLS error: {0}")]
    Tls(String),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Values that take precedence over the config file.
///
/// Usually filled from command line flags and their environment variables.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub hosts: Vec<String>,
    pub script_upstream: Option<String>,
    pub api_upstreams: Vec<String>,
    pub whitelist_headers: Vec<String>,
    pub tls_cert: Option<PathBuf>,
    pub tls_key: Option<PathBuf>,
    pub metrics_address: Option<String>,
}

impl ConfigOverrides {
    /// Apply the overrides on top of `config`.
    pub fn apply(self, config: &mut GatewayConfig) {
        if let Some(port) = self.port {
            config.listener.bind_address = format!("0.0.0.0:{port}");
        }
        if !self.hosts.is_empty() {
            config.hosts = self.hosts;
        }
        if let Some(script) = self.script_upstream.filter(|s| !s.trim().is_empty()) {
            config.upstreams.script = script;
        }
        if !self.api_upstreams.is_empty() {
            config.upstreams.api = self.api_upstreams;
        }
        if !self.whitelist_headers.is_empty() {
            config.headers.whitelist = self.whitelist_headers;
        }
        // TLS is only switched on when both files are known
        if let (Some(cert), Some(key)) = (self.tls_cert, self.tls_key) {
            config.listener.tls = Some(TlsConfig {
                cert_path: cert.to_string_lossy().into_owned(),
                key_path: key.to_string_lossy().into_owned(),
            });
        }
        if let Some(address) = self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = address;
        }
    }
}

/// Parse a TOML document into a configuration, without validating it.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load, override, normalize and validate the configuration.
///
/// Without a path the built-in defaults are the starting point.
pub fn load_config(
    path: Option<&Path>,
    overrides: ConfigOverrides,
) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            parse_config(&content)?
        }
        None => GatewayConfig::default(),
    };

    overrides.apply(&mut config);

    config.hosts = normalize_hosts("hosts", config.hosts);
    config.upstreams.api = normalize_hosts("upstreams.api", config.upstreams.api);

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Trim entries, drop empty ones and keep at most the first two.
fn normalize_hosts(field: &str, hosts: Vec<String>) -> Vec<String> {
    let mut hosts: Vec<String> = hosts
        .into_iter()
        .map(|h| h.trim().to_string())
        .filter(|h| !h.is_empty())
        .collect();

    if hosts.len() > REQUIRED_HOSTS {
        tracing::warn!(
            field,
            configured = hosts.len(),
            "More than two hosts are not supported, only the first two are used"
        );
        hosts.truncate(REQUIRED_HOSTS);
    }
    hosts
}
