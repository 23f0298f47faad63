//! Protocol switch handling.
//!
//! # Responsibilities
//! - Relay an upstream `101 Switching Protocols` to the client
//! - Splice the two upgraded connections once both sides have switched
//!
//! # Data Flow
//! ```text
//! Client ←──── raw bytes ────→ Proxy ←──── raw bytes ────→ Upstream
//! ```
//!
//! # Design Decisions
//! - Only a switch to the protocol the client asked for is relayed
//! - The tunnel is byte-level; frames are never inspected

use axum::body::Body;
use axum::http::header::{CONNECTION, UPGRADE};
use axum::http::HeaderValue;
use axum::response::Response;
use hyper::body::Incoming;
use hyper::upgrade::OnUpgrade;
use hyper_util::rt::TokioIo;
use tracing::Instrument;

use crate::http::error::{bad_gateway, ProxyError};
use crate::http::request::strip_hop_by_hop;
use crate::routing::UpstreamTarget;

/// Answer the client with the upstream's 101 and tunnel bytes between the
/// two connections in a background task.
///
/// `client` is the pending upgrade of the inbound connection and
/// `requested` the protocol the client asked for.
pub fn switch_protocols(
    client: OnUpgrade,
    requested: Option<HeaderValue>,
    mut response: axum::http::Response<Incoming>,
    target: &UpstreamTarget,
) -> Response {
    let offered = response.headers().get(UPGRADE).cloned();
    let protocol = match (requested, offered) {
        (Some(requested), Some(offered))
            if requested.as_bytes().eq_ignore_ascii_case(offered.as_bytes()) =>
        {
            offered
        }
        (requested, offered) => {
            return bad_gateway(&ProxyError::protocol_switch(
                target,
                requested.as_ref(),
                offered.as_ref(),
            ))
        }
    };

    let upstream = hyper::upgrade::on(&mut response);
    tokio::spawn(tunnel(client, upstream).in_current_span());

    let (mut parts, _) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    parts
        .headers
        .insert(CONNECTION, HeaderValue::from_static("upgrade"));
    tracing::debug!(protocol = ?protocol, "Switching protocols");
    parts.headers.insert(UPGRADE, protocol);

    Response::from_parts(parts, Body::empty())
}

async fn tunnel(client: OnUpgrade, upstream: OnUpgrade) {
    let (client, upstream) = match tokio::try_join!(client, upstream) {
        Ok(pair) => pair,
        Err(e) => {
            tracing::warn!(error = %e, "Protocol switch failed");
            return;
        }
    };

    let mut client = TokioIo::new(client);
    let mut upstream = TokioIo::new(upstream);
    match tokio::io::copy_bidirectional(&mut client, &mut upstream).await {
        Ok((from_client, from_upstream)) => {
            tracing::debug!(from_client, from_upstream, "Tunnel closed")
        }
        Err(e) => tracing::debug!(error = %e, "Tunnel closed with error"),
    }
}
