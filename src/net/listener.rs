//! TCP listener binding.
//!
//! # Responsibilities
//! - Resolve and bind the configured host and port
//! - Report bind failures before any traffic is served
//! - Hand a non-blocking std listener to the TLS server

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Bind to the configured address.
pub async fn bind(config: &ListenerConfig) -> Result<std::net::TcpListener, ListenerError> {
    let address = format!("{}:{}", config.host, config.port);
    let bind_error = |source| ListenerError::Bind {
        address: address.clone(),
        source,
    };

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .map_err(bind_error)?;

    let local_addr: SocketAddr = listener.local_addr().map_err(bind_error)?;
    tracing::info!(address = %local_addr, "Listener bound");

    // tokio listeners are already non-blocking, as axum-server requires.
    listener.into_std().map_err(bind_error)
}
