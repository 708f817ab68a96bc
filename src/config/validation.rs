//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that hosts and API upstreams pair up positionally
//! - Validate upstream URLs, hostnames and the bind address
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::routing::{extract_hostname, Upstream};

/// Number of public hostnames the gateway serves.
pub const REQUIRED_HOSTS: usize = 2;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("expected {expected} hosts, got {actual}")]
    HostCount { expected: usize, actual: usize },

    #[error("number of hosts ({hosts}) does not match number of api upstreams ({upstreams})")]
    UpstreamCountMismatch { hosts: usize, upstreams: usize },

    #[error("invalid host {host:?}: {reason}")]
    InvalidHost { host: String, reason: String },

    #[error("host {0:?} is configured more than once")]
    DuplicateHost(String),

    #[error("script upstream is not configured")]
    MissingScriptUpstream,

    #[error("invalid {role} upstream {url:?}: {reason}")]
    InvalidUpstream {
        role: &'static str,
        url: String,
        reason: String,
    },

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),

    #[error("tls cert and key paths must both be set")]
    IncompleteTls,

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.hosts.len() != REQUIRED_HOSTS {
        errors.push(ValidationError::HostCount {
            expected: REQUIRED_HOSTS,
            actual: config.hosts.len(),
        });
    }

    if config.hosts.len() != config.upstreams.api.len() {
        errors.push(ValidationError::UpstreamCountMismatch {
            hosts: config.hosts.len(),
            upstreams: config.upstreams.api.len(),
        });
    }

    let mut seen = HashSet::new();
    for host in &config.hosts {
        match extract_hostname(host) {
            Ok(hostname) if hostname.is_empty() => errors.push(ValidationError::InvalidHost {
                host: host.clone(),
                reason: "empty hostname".to_string(),
            }),
            Ok(hostname) => {
                if !seen.insert(hostname) {
                    errors.push(ValidationError::DuplicateHost(host.clone()));
                }
            }
            Err(e) => errors.push(ValidationError::InvalidHost {
                host: host.clone(),
                reason: e.to_string(),
            }),
        }
    }

    if config.upstreams.script.trim().is_empty() {
        errors.push(ValidationError::MissingScriptUpstream);
    } else if let Err(reason) = Upstream::parse(&config.upstreams.script) {
        errors.push(ValidationError::InvalidUpstream {
            role: "script",
            url: config.upstreams.script.clone(),
            reason,
        });
    }

    for url in &config.upstreams.api {
        if let Err(reason) = Upstream::parse(url) {
            errors.push(ValidationError::InvalidUpstream {
                role: "api",
                url: url.clone(),
                reason,
            });
        }
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.trim().is_empty() || tls.key_path.trim().is_empty() {
            errors.push(ValidationError::IncompleteTls);
        }
    }

    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.upstream_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroValue("timeouts.request_secs"));
    }
    if config.limits.max_script_body_bytes == 0 {
        errors.push(ValidationError::ZeroValue("limits.max_script_body_bytes"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;

    fn valid_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.hosts = vec!["host1.com".into(), "host2.com:8080".into()];
        config.upstreams.script = "https://cdn.keytiles.com".into();
        config.upstreams.api = vec![
            "https://api.keytiles.com".into(),
            "https://api2.keytiles.com".into(),
        ];
        config
    }

    #[test]
    fn test_valid_config() {
        assert_eq!(validate_config(&valid_config()), Ok(()));
    }

    #[test]
    fn test_empty_config_reports_everything() {
        let errors = validate_config(&GatewayConfig::default()).unwrap_err();
        assert!(errors.contains(&ValidationError::HostCount { expected: 2, actual: 0 }));
        assert!(errors.contains(&ValidationError::MissingScriptUpstream));
    }

    #[test]
    fn test_count_mismatch() {
        let mut config = valid_config();
        config.upstreams.api.pop();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::UpstreamCountMismatch { hosts: 2, upstreams: 1 }]
        );
    }

    #[test]
    fn test_duplicate_hosts() {
        let mut config = valid_config();
        config.hosts = vec!["host1.com".into(), "HOST1.com:443".into()];
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors, vec![ValidationError::DuplicateHost("HOST1.com:443".into())]);
    }

    #[test]
    fn test_invalid_upstreams() {
        let mut config = valid_config();
        config.upstreams.script = "cdn.keytiles.com".into();
        config.upstreams.api[1] = "ftp://api2.keytiles.com".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[0], ValidationError::InvalidUpstream { role: "script", .. }));
        assert!(matches!(errors[1], ValidationError::InvalidUpstream { role: "api", .. }));
    }

    #[test]
    fn test_listener_checks() {
        let mut config = valid_config();
        config.listener.bind_address = "not-an-address".into();
        config.listener.tls = Some(TlsConfig {
            cert_path: "cert.pem".into(),
            key_path: String::new(),
        });
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidBindAddress("not-an-address".into()),
                ValidationError::IncompleteTls,
            ]
        );
    }
}
