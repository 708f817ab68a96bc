//! Client IP anonymization.
//!
//! # Responsibilities
//! - Pick the client address (first `X-Forwarded-For` entry, else peer address)
//! - Strip brackets and ports
//! - Mask IPv4 to /24 and IPv6 to /64
//!
//! # Design Decisions
//! - An unparseable address yields an empty string, not an error; the empty
//!   value is still written to the forwarded header
//! - The leading `X-Forwarded-For` entry is treated as the client

use std::net::{Ipv4Addr, Ipv6Addr};

use axum::http::{HeaderMap, HeaderValue};

use crate::routing::host::split_host_port;
use crate::security::headers::X_FORWARDED_FOR;

const IPV6_KEPT_BITS: u32 = 64;

/// Compute the anonymized client IP for a request.
///
/// A non-empty `X-Forwarded-For` always wins over the peer address, even when
/// its first entry turns out to be unusable.
pub fn anonymize_ip(headers: &HeaderMap, remote_addr: &str) -> String {
    match headers.get(X_FORWARDED_FOR).map(HeaderValue::as_bytes) {
        Some(raw) if !raw.is_empty() => {
            let first = raw.split(|b| *b == b',').next().unwrap_or_default();
            match std::str::from_utf8(first) {
                Ok(entry) => mask_ip(entry.trim()),
                Err(_) => parse_failure(&String::from_utf8_lossy(first)),
            }
        }
        _ => mask_ip(remote_addr),
    }
}

/// Mask an address string; returns `""` when it is not a valid IP.
pub fn mask_ip(candidate: &str) -> String {
    for c in candidate.chars() {
        match c {
            '.' => return mask_ipv4(candidate).unwrap_or_else(|| parse_failure(candidate)),
            ':' => return mask_ipv6(candidate).unwrap_or_else(|| parse_failure(candidate)),
            _ => {}
        }
    }
    parse_failure(candidate)
}

fn mask_ipv4(candidate: &str) -> Option<String> {
    let host = if candidate.contains(':') {
        split_host_port(candidate).ok()?.0
    } else {
        candidate
    };
    let [a, b, c, _] = host.parse::<Ipv4Addr>().ok()?.octets();
    Some(Ipv4Addr::new(a, b, c, 0).to_string())
}

fn mask_ipv6(candidate: &str) -> Option<String> {
    let host = if candidate.contains("]:") {
        split_host_port(candidate).ok()?.0
    } else {
        candidate
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let addr = host.parse::<Ipv6Addr>().ok()?;
    let mask = u128::MAX << (128 - IPV6_KEPT_BITS);
    Some(Ipv6Addr::from(u128::from(addr) & mask).to_string())
}

fn parse_failure(candidate: &str) -> String {
    tracing::warn!(address = %candidate, "Could not parse client IP, forwarding empty value");
    String::new()
}
