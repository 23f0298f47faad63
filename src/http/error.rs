//! Forwarding failures and how clients see them.
//!
//! Every failure to obtain an upstream response ends the exchange with
//! `502 Bad Gateway` and an empty body. Failures are never retried and
//! never affect other exchanges.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use hyper_util::client::legacy;
use std::time::Duration;

use crate::routing::UpstreamTarget;

/// Why an exchange could not be completed.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("failed to connect to upstream {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: legacy::Error,
    },

    #[error("upstream {target} did not respond within {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("upstream {target} failed: {source}")]
    Upstream {
        target: String,
        #[source]
        source: legacy::Error,
    },

    #[error("upstream {target} switched protocol to {offered:?} when {requested:?} was requested")]
    ProtocolSwitch {
        target: String,
        requested: String,
        offered: String,
    },
}

impl ProxyError {
    /// Classify an error returned by the upstream client.
    pub fn from_client(target: &UpstreamTarget, source: legacy::Error) -> Self {
        let target = target.to_string();
        if source.is_connect() {
            ProxyError::Connect { target, source }
        } else {
            ProxyError::Upstream { target, source }
        }
    }

    pub fn timeout(target: &UpstreamTarget, timeout: Duration) -> Self {
        ProxyError::Timeout {
            target: target.to_string(),
            timeout,
        }
    }

    /// The upstream answered 101 with a protocol the client did not ask for.
    pub fn protocol_switch(
        target: &UpstreamTarget,
        requested: Option<&HeaderValue>,
        offered: Option<&HeaderValue>,
    ) -> Self {
        let label = |value: Option<&HeaderValue>| {
            value
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        ProxyError::ProtocolSwitch {
            target: target.to_string(),
            requested: label(requested),
            offered: label(offered),
        }
    }

    /// Short label for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ProxyError::Connect { .. } => "connect",
            ProxyError::Timeout { .. } => "timeout",
            ProxyError::Upstream { .. } => "upstream",
            ProxyError::ProtocolSwitch { .. } => "protocol_switch",
        }
    }
}

/// Record the failure and answer the client with 502.
pub fn bad_gateway(error: &ProxyError) -> Response {
    tracing::error!(kind = error.kind(), error = %error, "Proxy error");
    StatusCode::BAD_GATEWAY.into_response()
}
