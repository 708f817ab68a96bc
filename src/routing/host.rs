//! Hostname extraction from `Host` values.
//!
//! # Responsibilities
//! - Accept `host`, `host:port`, `[v6]:port` and `scheme://host[:port]` forms
//! - Produce the canonical key used by the upstream map
//!
//! # Design Decisions
//! - Canonical form is lower-case, without scheme, port or brackets
//! - Extraction is idempotent: a canonical hostname maps to itself

use url::Url;

use crate::error::RoutingError;

/// Reduce a declared host to its canonical hostname.
pub fn extract_hostname(host: &str) -> Result<String, RoutingError> {
    let host = host.trim();

    // http://blabla.com or https://blabla.com:8080
    if host.contains("://") {
        let url = Url::parse(host).map_err(|e| malformed(host, e.to_string()))?;
        let hostname = url
            .host_str()
            .ok_or_else(|| malformed(host, "url has no host".to_string()))?;
        return Ok(strip_brackets(hostname).to_ascii_lowercase());
    }

    if !host.contains(':') {
        return Ok(host.to_ascii_lowercase());
    }

    let (hostname, _port) = split_host_port(host)?;
    Ok(hostname.to_ascii_lowercase())
}

/// Split `host:port` or `[host]:port` into its parts.
///
/// Unbracketed hosts may not contain a colon themselves.
pub fn split_host_port(hostport: &str) -> Result<(&str, &str), RoutingError> {
    if let Some(rest) = hostport.strip_prefix('[') {
        let end = rest
            .find(']')
            .ok_or_else(|| malformed(hostport, "missing ']' in address".to_string()))?;
        let hostname = &rest[..end];
        let port = match &rest[end + 1..] {
            "" => "",
            tail => tail
                .strip_prefix(':')
                .ok_or_else(|| malformed(hostport, "unexpected text after ']'".to_string()))?,
        };
        return Ok((hostname, port));
    }

    let (hostname, port) = hostport
        .rsplit_once(':')
        .ok_or_else(|| malformed(hostport, "missing port in address".to_string()))?;
    if hostname.contains(':') {
        return Err(malformed(hostport, "too many colons in address".to_string()));
    }
    Ok((hostname, port))
}

fn strip_brackets(host: &str) -> &str {
    host.strip_prefix('[')
        .and_then(|h| h.strip_suffix(']'))
        .unwrap_or(host)
}

fn malformed(host: &str, reason: String) -> RoutingError {
    RoutingError::MalformedHost {
        host: host.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_hostname() {
        assert_eq!(extract_hostname("host1.com").unwrap(), "host1.com");
        assert_eq!(extract_hostname("Host1.COM").unwrap(), "host1.com");
    }

    #[test]
    fn test_hostname_with_port() {
        assert_eq!(extract_hostname("host2.com:8080").unwrap(), "host2.com");
        assert_eq!(extract_hostname("127.0.0.1:9999").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_hostname_with_scheme() {
        assert_eq!(extract_hostname("http://blabla.com").unwrap(), "blabla.com");
        assert_eq!(extract_hostname("https://blabla.com:8080").unwrap(), "blabla.com");
        assert_eq!(extract_hostname("http://[::1]:8080").unwrap(), "::1");
    }

    #[test]
    fn test_hostname_starting_with_http_is_not_a_url() {
        assert_eq!(extract_hostname("httpbin.org").unwrap(), "httpbin.org");
    }

    #[test]
    fn test_bracketed_ipv6() {
        assert_eq!(extract_hostname("[2001:db8::1]:443").unwrap(), "2001:db8::1");
        assert_eq!(extract_hostname("[2001:db8::1]").unwrap(), "2001:db8::1");
    }

    #[test]
    fn test_extraction_is_idempotent() {
        for host in ["host1.com", "host2.com:8080", "http://a.example.org:1", "[::1]:80"] {
            let once = extract_hostname(host).unwrap();
            if once.contains(':') {
                // bare IPv6 cannot round-trip without brackets
                continue;
            }
            assert_eq!(extract_hostname(&once).unwrap(), once);
        }
    }

    #[test]
    fn test_malformed_hosts() {
        assert!(matches!(
            extract_hostname("2001:db8::1"),
            Err(RoutingError::MalformedHost { .. })
        ));
        assert!(matches!(
            extract_hostname("[::1"),
            Err(RoutingError::MalformedHost { .. })
        ));
        assert!(matches!(
            extract_hostname("[::1]x"),
            Err(RoutingError::MalformedHost { .. })
        ));
        assert!(matches!(
            extract_hostname("http://"),
            Err(RoutingError::MalformedHost { .. })
        ));
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("a.com:80").unwrap(), ("a.com", "80"));
        assert_eq!(split_host_port("[::1]:80").unwrap(), ("::1", "80"));
        assert_eq!(split_host_port("a.com:").unwrap(), ("a.com", ""));
    }
}
