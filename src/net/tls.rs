//! TLS configuration and certificate loading.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

use crate::config::ConfigError;

/// Load TLS configuration from certificate and key files.
///
/// Both files are checked for usable PEM content first, so a bad pair is
/// reported at startup with the offending path.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> Result<RustlsConfig, ConfigError> {
    check_pem_pair(cert_path, key_path)?;

    // hyper-rustls and axum-server enable different providers; pick one explicitly
    let _ = rustls::crypto::ring::default_provider().install_default();

    RustlsConfig::from_pem_file(cert_path, key_path)
        .await
        .map_err(|e| ConfigError::Tls(format!("{}: {e}", cert_path.display())))
}

/// Verify that `cert_path` holds at least one certificate and `key_path` a private key.
pub fn check_pem_pair(cert_path: &Path, key_path: &Path) -> Result<(), ConfigError> {
    let mut certs = BufReader::new(open(cert_path)?);
    let certs = rustls_pemfile::certs(&mut certs)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ConfigError::Tls(format!("{}: {e}", cert_path.display())))?;
    if certs.is_empty() {
        return Err(ConfigError::Tls(format!(
            "{}: no certificate found",
            cert_path.display()
        )));
    }

    let mut key = BufReader::new(open(key_path)?);
    match rustls_pemfile::private_key(&mut key) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => Err(ConfigError::Tls(format!(
            "{}: no private key found",
            key_path.display()
        ))),
        Err(e) => Err(ConfigError::Tls(format!("{}: {e}", key_path.display()))),
    }
}

fn open(path: &Path) -> Result<File, ConfigError> {
    File::open(path).map_err(|e| ConfigError::Tls(format!("{}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_certificate() {
        let result = check_pem_pair(Path::new("/no/such/cert.pem"), Path::new("/no/such/key.pem"));
        match result {
            Err(ConfigError::Tls(msg)) => assert!(msg.contains("/no/such/cert.pem")),
            other => panic!("expected TLS error, got {other:?}"),
        }
    }

    #[test]
    fn test_file_without_pem_blocks() {
        let mut cert = tempfile::NamedTempFile::new().unwrap();
        cert.write_all(b"this is not a certificate\n").unwrap();
        let key = tempfile::NamedTempFile::new().unwrap();

        let result = check_pem_pair(cert.path(), key.path());
        match result {
            Err(ConfigError::Tls(msg)) => assert!(msg.contains("no certificate found")),
            other => panic!("expected TLS error, got {other:?}"),
        }
    }
}
