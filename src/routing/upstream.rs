//! Upstream targets and the host → upstream map.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::error::RoutingError;
use crate::routing::host::extract_hostname;

/// A backend target that receives forwarded requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    scheme: String,
    authority: String,
    base_path: String,
    base_query: Option<String>,
}

impl Upstream {
    /// Parse an upstream from an absolute `http`/`https` URL.
    pub fn parse(raw: &str) -> Result<Self, String> {
        let url = Url::parse(raw.trim()).map_err(|e| e.to_string())?;
        match url.scheme() {
            "http" | "https" => {}
            other => return Err(format!("unsupported scheme {other:?}")),
        }
        let host = url.host_str().ok_or_else(|| "url has no host".to_string())?;
        let authority = match url.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        };

        Ok(Self {
            scheme: url.scheme().to_string(),
            authority,
            base_path: url.path().to_string(),
            base_query: url.query().filter(|q| !q.is_empty()).map(str::to_string),
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Host and optional port, as written in a URI authority.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    pub fn base_query(&self) -> Option<&str> {
        self.base_query.as_deref()
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.authority, self.base_path)?;
        if let Some(query) = &self.base_query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}

/// Immutable mapping from canonical hostname to upstream.
///
/// Built once at startup and shared read-only between request tasks.
#[derive(Debug, Clone, Default)]
pub struct UpstreamMap {
    entries: HashMap<String, Upstream>,
}

impl UpstreamMap {
    /// Build the map from positionally matched hosts and upstreams.
    ///
    /// Hosts are reduced to canonical hostnames first; a duplicate hostname
    /// is rejected since it would silently shadow an earlier entry.
    pub fn build<'a>(
        pairs: impl IntoIterator<Item = (&'a str, Upstream)>,
    ) -> Result<Self, RoutingError> {
        let mut entries = HashMap::new();
        for (host, upstream) in pairs {
            let hostname = extract_hostname(host)?;
            if entries.insert(hostname.clone(), upstream).is_some() {
                return Err(RoutingError::MalformedHost {
                    host: host.to_string(),
                    reason: format!("hostname {hostname:?} configured twice"),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Look up the upstream for a canonical hostname.
    pub fn resolve(&self, hostname: &str) -> Result<&Upstream, RoutingError> {
        self.entries
            .get(hostname)
            .ok_or_else(|| RoutingError::UnknownHost(hostname.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
