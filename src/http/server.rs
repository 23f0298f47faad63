//! HTTP server setup and the proxy engine.
//!
//! # Responsibilities
//! - Create the Axum Router that sends every request to the proxy handler
//! - Forward requests to the upstream over a pooled plain-HTTP client
//! - Apply the director before transmission and the Content-Type
//!   correction before the response reaches the client
//! - Hand protocol switches (101) to the upgrade tunnel
//! - Serve over TLS and drain in-flight exchanges on shutdown
//!
//! # Design Decisions
//! - The error policy owns failure logging; the trace layer records
//!   5xx responses at DEBUG only

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode, Version},
    response::Response,
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::{TokioExecutor, TokioTimer},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::{DefaultOnFailure, TraceLayer};
use tracing::{Instrument, Level};
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::http::error::{bad_gateway, ProxyError};
use crate::http::request::{append_forwarded_for, direct, strip_hop_by_hop, strip_request_hop_by_hop};
use crate::http::response::{correct_content_type, decoded_path};
use crate::http::upgrade::switch_protocols;
use crate::lifecycle::{ServerState, ShutdownSignal, StateMachine};
use crate::routing::TargetResolver;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<dyn TargetResolver>,
    pub client: Client<HttpConnector, Body>,
    /// Deadline for upstream response headers.
    pub upstream_timeout: Duration,
}

impl AppState {
    pub fn new(config: &ProxyConfig, resolver: Arc<dyn TargetResolver>) -> Self {
        let client = Client::builder(TokioExecutor::new())
            .pool_idle_timeout(config.timeouts.idle())
            .pool_timer(TokioTimer::new())
            .build(HttpConnector::new());

        Self {
            resolver,
            client,
            upstream_timeout: config.timeouts.write(),
        }
    }
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig, resolver: Arc<dyn TargetResolver>) -> Self {
        let state = AppState::new(&config, resolver);
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    pub fn build_router(state: AppState) -> Router {
        Router::new()
            .fallback(proxy_handler)
            .with_state(state)
            .layer(
                ServiceBuilder::new().layer(
                    TraceLayer::new_for_http()
                        .on_failure(DefaultOnFailure::new().level(Level::DEBUG)),
                ),
            )
    }

    /// Router serving the proxy, for driving it without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve TLS connections on `listener` until `shutdown` fires, then
    /// drain for the configured grace period.
    pub async fn run(
        self,
        listener: std::net::TcpListener,
        tls: RustlsConfig,
        mut shutdown: ShutdownSignal,
        state: StateMachine,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        let grace = self.config.timeouts.shutdown_grace();
        let handle = Handle::new();

        let drain = handle.clone();
        let drain_state = state.clone();
        tokio::spawn(async move {
            let reason = shutdown.recv().await;
            drain_state.advance(ServerState::Draining);
            tracing::info!(
                %reason,
                in_flight = drain.connection_count(),
                grace_secs = grace.as_secs(),
                "Shutting down server..."
            );
            drain.graceful_shutdown(Some(grace));
        });

        let mut server = axum_server::from_tcp_rustls(listener, tls).handle(handle.clone());
        server
            .http_builder()
            .http1()
            .timer(TokioTimer::new())
            .header_read_timeout(self.config.timeouts.read());

        state.advance(ServerState::Listening);
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream_address(),
            "Starting reverse proxy"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();
        let result = server.serve(app).await;

        let remaining = handle.connection_count();
        if remaining > 0 {
            tracing::warn!(
                remaining,
                "Grace period elapsed; closing remaining connections"
            );
        }
        if let Err(e) = &result {
            tracing::error!(error = %e, "Server shutdown error");
        }

        state.advance(ServerState::Stopped);
        tracing::info!("HTTP server stopped");
        result
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Every request, whatever its path or method, goes to the upstream.
async fn proxy_handler(
    State(state): State<AppState>,
    ConnectInfo(client_addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let span = tracing::info_span!(
        "exchange",
        request_id = %Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
        peer = %client_addr,
    );
    forward(state, client_addr, request).instrument(span).await
}

async fn forward(state: AppState, client_addr: SocketAddr, mut request: Request<Body>) -> Response {
    let path = decoded_path(request.uri().path()).into_owned();
    let target = state.resolver.resolve(&request);
    let client_upgrade = hyper::upgrade::on(&mut request);

    let requested_upgrade = strip_request_hop_by_hop(request.headers_mut());
    direct(&mut request, &target, client_addr);
    append_forwarded_for(request.headers_mut(), client_addr.ip());
    // The upstream speaks HTTP/1.1 even when the client used HTTP/2.
    *request.version_mut() = Version::HTTP_11;

    tracing::debug!(upstream = %target, uri = %request.uri(), "Forwarding request");

    let response = match tokio::time::timeout(state.upstream_timeout, state.client.request(request)).await {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => return bad_gateway(&ProxyError::from_client(&target, e)),
        Err(_) => return bad_gateway(&ProxyError::timeout(&target, state.upstream_timeout)),
    };

    if response.status() == StatusCode::SWITCHING_PROTOCOLS {
        return switch_protocols(client_upgrade, requested_upgrade, response, &target);
    }

    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    correct_content_type(&mut parts.headers, &path);

    tracing::debug!(status = %parts.status, "Relaying response");
    Response::from_parts(parts, Body::new(body))
}
