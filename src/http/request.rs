//! Request direction and transformation.
//!
//! # Responsibilities
//! - Point the request at the upstream (scheme, authority, Host)
//! - Record where the request came from (X-Forwarded-*, X-Real-IP)
//! - Strip hop-by-hop headers before forwarding, keeping a requested
//!   protocol switch and `TE: trailers`
//!
//! # Design Decisions
//! - Forwarding headers are appended, never replaced: a client-supplied
//!   header of the same name survives next to the injected one
//! - Direction cannot fail; unusable values are forwarded unchanged

use axum::body::Body;
use axum::http::header::{CONNECTION, HOST, TE, UPGRADE};
use axum::http::uri::PathAndQuery;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Uri};
use std::net::{IpAddr, SocketAddr};

use crate::routing::UpstreamTarget;

pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

/// Headers that describe a single transport hop and must not be relayed.
const HOP_BY_HOP_HEADERS: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-connection",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Host the client asked for: `Host` header, else the URI authority
/// (HTTP/2 carries it as `:authority`), else empty.
pub fn original_host(req: &Request<Body>) -> String {
    req.headers()
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default()
}

/// Rewrite `req` in place so it targets `target`.
pub fn direct(req: &mut Request<Body>, target: &UpstreamTarget, client_addr: SocketAddr) {
    let original_host = original_host(req);

    let mut parts = req.uri().clone().into_parts();
    parts.scheme = Some(target.scheme().clone());
    parts.authority = Some(target.authority().clone());
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }
    if let Ok(uri) = Uri::from_parts(parts) {
        *req.uri_mut() = uri;
    }

    let headers = req.headers_mut();
    if let Ok(host) = HeaderValue::from_str(target.authority().as_str()) {
        headers.insert(HOST, host);
    }
    append(headers, X_FORWARDED_HOST, &original_host);
    append(headers, X_FORWARDED_PROTO, target.scheme().as_str());
    append(headers, X_REAL_IP, &client_addr.to_string());
}

fn append(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(value) => {
            headers.append(name, value);
        }
        Err(_) => tracing::debug!(header = %name, "Skipping unrepresentable forwarding header"),
    }
}

/// Add the caller to the `X-Forwarded-For` chain.
///
/// Existing values are folded into one comma-separated header with the
/// caller last.
pub fn append_forwarded_for(headers: &mut HeaderMap, client_ip: IpAddr) {
    let prior: Vec<&str> = headers
        .get_all(&X_FORWARDED_FOR)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    let chain = if prior.is_empty() {
        client_ip.to_string()
    } else {
        format!("{}, {}", prior.join(", "), client_ip)
    };

    if let Ok(value) = HeaderValue::from_str(&chain) {
        headers.insert(X_FORWARDED_FOR, value);
    }
}

/// Whether any value of `name` lists `token` (comma-separated, any case).
fn has_token(headers: &HeaderMap, name: HeaderName, token: &str) -> bool {
    headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|t| t.trim().eq_ignore_ascii_case(token))
}

/// Protocol the client asks to switch to: the `Upgrade` value, when
/// `Connection` carries the `upgrade` token.
pub fn upgrade_type(headers: &HeaderMap) -> Option<HeaderValue> {
    if !has_token(headers, CONNECTION, "upgrade") {
        return None;
    }
    headers.get(UPGRADE).cloned()
}

/// Strip hop-by-hop headers from an outbound request.
///
/// A requested protocol switch is re-declared so the upstream can accept
/// it, and `TE: trailers` survives. Returns the requested protocol.
pub fn strip_request_hop_by_hop(headers: &mut HeaderMap) -> Option<HeaderValue> {
    let upgrade = upgrade_type(headers);
    let trailers = has_token(headers, TE, "trailers");

    strip_hop_by_hop(headers);

    if trailers {
        headers.insert(TE, HeaderValue::from_static("trailers"));
    }
    if let Some(protocol) = &upgrade {
        headers.insert(CONNECTION, HeaderValue::from_static("upgrade"));
        headers.insert(UPGRADE, protocol.clone());
    }
    upgrade
}

/// Remove hop-by-hop headers, including any named in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let named: Vec<String> = headers
        .get_all(CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    for name in &named {
        headers.remove(name.as_str());
    }
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}
