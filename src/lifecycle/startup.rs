//! Startup orchestration.
//!
//! # Responsibilities
//! - Load TLS material and bind the listener (Initializing)
//! - Build the proxy engine for the configured upstream
//! - Serve until shutdown, then drain (Listening → Draining → Stopped)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener serves last (traffic only when ready)

use axum_server::tls_rustls::RustlsConfig;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::http::HttpServer;
use crate::lifecycle::{ShutdownSignal, StateMachine};
use crate::net::{self, ListenerError, TlsError};
use crate::routing::{FixedUpstream, UpstreamTarget};

/// Reasons the proxy could not start or keep serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Tls(#[from] TlsError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("invalid upstream address: {0}")]
    Upstream(#[from] axum::http::uri::InvalidUri),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A bound, TLS-ready listener together with the engine it will serve.
pub struct ServerHandle {
    listener: std::net::TcpListener,
    tls: RustlsConfig,
    server: HttpServer,
}

impl ServerHandle {
    /// Perform every fallible startup step: TLS material, bind, engine.
    pub async fn initialize(config: ProxyConfig) -> Result<Self, StartupError> {
        let tls = net::load_tls_config(&config.tls.cert_path, &config.tls.key_path).await?;
        let listener = net::bind(&config.listener).await?;
        let target = UpstreamTarget::from_config(&config)?;

        tracing::info!(upstream = %target, "Upstream configured");

        let server = HttpServer::new(config, Arc::new(FixedUpstream::new(target)));
        Ok(Self {
            listener,
            tls,
            server,
        })
    }

    /// Address actually bound (useful when the configured port is 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until `shutdown` fires and the drain completes.
    pub async fn serve(
        self,
        shutdown: ShutdownSignal,
        state: StateMachine,
    ) -> Result<(), StartupError> {
        self.server
            .run(self.listener, self.tls, shutdown, state)
            .await
            .map_err(StartupError::Serve)
    }
}

/// Initialize and serve in one step.
pub async fn run(
    config: ProxyConfig,
    shutdown: ShutdownSignal,
    state: StateMachine,
) -> Result<(), StartupError> {
    ServerHandle::initialize(config)
        .await?
        .serve(shutdown, state)
        .await
}
