//! Response handling and transformation.
//!
//! # Responsibilities
//! - Rebrand successful script responses with the public hostnames
//! - Keep `content-length` truthful after rewriting
//! - Leave every other response untouched
//!
//! # Design Decisions
//! - Only 200 responses are buffered; everything else keeps streaming
//! - Buffering is bounded; a body that cannot be read becomes a 502
//! - Replacements are literal byte substitutions, applied in order

use axum::{
    body::Body,
    http::{header, HeaderValue, Response, StatusCode},
};

use crate::error::GatewayError;

/// Hostnames the script upstream embeds in its payload, in replacement order.
pub const SCRIPT_UPSTREAM_HOSTS: [&str; 2] = ["api.keytiles.com", "api2.keytiles.com"];

/// Rewrites embedded upstream hostnames in script responses.
#[derive(Debug, Clone)]
pub struct ScriptBodyRewriter {
    replacements: [(Vec<u8>, Vec<u8>); 2],
    max_body_bytes: usize,
}

impl ScriptBodyRewriter {
    /// `public_hosts[i]` replaces `SCRIPT_UPSTREAM_HOSTS[i]`.
    pub fn new(public_hosts: [&str; 2], max_body_bytes: usize) -> Self {
        let pair = |i: usize| {
            (
                SCRIPT_UPSTREAM_HOSTS[i].as_bytes().to_vec(),
                public_hosts[i].as_bytes().to_vec(),
            )
        };
        Self {
            replacements: [pair(0), pair(1)],
            max_body_bytes,
        }
    }

    /// Rewrite a script response if it is a 200, otherwise return it as is.
    pub async fn rewrite(&self, response: Response<Body>) -> Result<Response<Body>, GatewayError> {
        if response.status() != StatusCode::OK {
            return Ok(response);
        }

        let (mut parts, body) = response.into_parts();
        let original = axum::body::to_bytes(body, self.max_body_bytes)
            .await
            .map_err(|e| GatewayError::BodyRead(e.to_string()))?;

        let rewritten = self
            .replacements
            .iter()
            .fold(original.to_vec(), |body, (from, to)| replace_all(&body, from, to));

        tracing::debug!(
            original_len = original.len(),
            rewritten_len = rewritten.len(),
            "Rewrote script body"
        );

        parts.headers.remove(header::TRANSFER_ENCODING);
        parts
            .headers
            .insert(header::CONTENT_LENGTH, HeaderValue::from(rewritten.len()));

        Ok(Response::from_parts(parts, Body::from(rewritten)))
    }
}

/// Replace every non-overlapping occurrence of `from` in `haystack`.
pub fn replace_all(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return haystack.to_vec();
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}
