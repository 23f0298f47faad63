//! Upstream target resolution.
//!
//! # Responsibilities
//! - Build the upstream target once from configuration
//! - Answer "where does this request go?" for the proxy engine
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Selection is a trait so a multi-target strategy can replace the
//!   fixed one without touching the director or the engine

use axum::body::Body;
use axum::http::uri::{Authority, InvalidUri, Scheme};
use axum::http::Request;
use std::str::FromStr;

use crate::config::ProxyConfig;

/// Scheme and authority a request is forwarded to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamTarget {
    scheme: Scheme,
    authority: Authority,
}

impl UpstreamTarget {
    /// Plain-HTTP target at `host:port`.
    pub fn http(host: &str, port: u16) -> Result<Self, InvalidUri> {
        let authority = if host.contains(':') && !host.starts_with('[') {
            Authority::from_str(&format!("[{}]:{}", host, port))?
        } else {
            Authority::from_str(&format!("{}:{}", host, port))?
        };
        Ok(Self {
            scheme: Scheme::HTTP,
            authority,
        })
    }

    /// Target derived from the configured upstream.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, InvalidUri> {
        Self::http(&config.upstream.host, config.upstream.port)
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn authority(&self) -> &Authority {
        &self.authority
    }
}

impl std::fmt::Display for UpstreamTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}", self.scheme, self.authority)
    }
}

/// Picks the upstream for a request.
pub trait TargetResolver: Send + Sync + std::fmt::Debug {
    fn resolve(&self, req: &Request<Body>) -> UpstreamTarget;
}

/// Sends every request to the same upstream.
#[derive(Debug, Clone)]
pub struct FixedUpstream {
    target: UpstreamTarget,
}

impl FixedUpstream {
    pub fn new(target: UpstreamTarget) -> Self {
        Self { target }
    }
}

impl TargetResolver for FixedUpstream {
    fn resolve(&self, _req: &Request<Body>) -> UpstreamTarget {
        self.target.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_target() {
        let target = UpstreamTarget::http("127.0.0.1", 8443).unwrap();
        assert_eq!(target.scheme(), &Scheme::HTTP);
        assert_eq!(target.authority().as_str(), "127.0.0.1:8443");
        assert_eq!(target.to_string(), "http://127.0.0.1:8443");
    }

    #[test]
    fn ipv6_host_bracketed() {
        let target = UpstreamTarget::http("::1", 8080).unwrap();
        assert_eq!(target.authority().as_str(), "[::1]:8080");
    }

    #[test]
    fn invalid_host_rejected() {
        assert!(UpstreamTarget::http("bad host", 80).is_err());
    }

    #[test]
    fn from_config() {
        let mut config = ProxyConfig::default();
        config.upstream.host = "backend.internal".into();
        config.upstream.port = 9000;
        let target = UpstreamTarget::from_config(&config).unwrap();
        assert_eq!(target.authority().host(), "backend.internal");
        assert_eq!(target.authority().port_u16(), Some(9000));
    }

    #[test]
    fn fixed_upstream_ignores_request() {
        let target = UpstreamTarget::http("127.0.0.1", 3000).unwrap();
        let resolver = FixedUpstream::new(target.clone());

        let req = Request::builder()
            .uri("https://somewhere.else/path")
            .header("Host", "somewhere.else")
            .body(Body::empty())
            .unwrap();
        assert_eq!(resolver.resolve(&req), target);
    }
}
