//! Shared utilities for integration testing.

use std::future::Future;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tls_reverse_proxy::config::ProxyConfig;
use tls_reverse_proxy::lifecycle::{ServerHandle, ServerState, StartupError, StateMachine};
use tls_reverse_proxy::Shutdown;

/// Build a raw HTTP/1.1 response that closes the connection.
pub fn http_response(status: &str, content_type: Option<&str>, body: &str) -> String {
    let content_type = content_type
        .map(|ct| format!("Content-Type: {}\r\n", ct))
        .unwrap_or_default();
    format!(
        "HTTP/1.1 {}\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        content_type,
        body.len(),
        body
    )
}

/// Value of the Content-Length header in a raw request head, or 0.
pub fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())
                .flatten()
        })
        .unwrap_or(0)
}

/// Read a raw request head. Returns it with the number of body bytes that
/// arrived in the same reads, or `None` if the peer went away first.
#[allow(dead_code)]
pub async fn read_head(socket: &mut TcpStream) -> Option<(String, usize)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end + 4]).to_string();
            return Some((head, buf.len() - end - 4));
        }
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
}

/// Start a programmable mock backend.
///
/// `f` receives the raw request head and returns the raw response. Every
/// request head is also sent to the returned channel.
#[allow(dead_code)]
pub async fn start_programmable_backend<F, Fut>(f: F) -> (SocketAddr, mpsc::UnboundedReceiver<String>)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = String> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();
    let f = Arc::new(f);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = f.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let Some((head, early)) = read_head(&mut socket).await else {
                    return;
                };
                let _ = tx.send(head.clone());

                // Consume the body so closing the socket does not reset it.
                let mut chunk = [0u8; 1024];
                let mut remaining = content_length(&head).saturating_sub(early);
                while remaining > 0 {
                    match socket.read(&mut chunk).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => remaining = remaining.saturating_sub(n),
                    }
                }

                let response = f(head).await;
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    (addr, rx)
}

/// Start a mock backend that always returns the same response.
#[allow(dead_code)]
pub async fn start_mock_backend(response: String) -> (SocketAddr, mpsc::UnboundedReceiver<String>) {
    start_programmable_backend(move |_| {
        let response = response.clone();
        async move { response }
    })
    .await
}

/// An address nothing listens on.
#[allow(dead_code)]
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Proxy config for tests: ephemeral listen port, fixture TLS material.
pub fn proxy_config(upstream: SocketAddr) -> ProxyConfig {
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures");
    let mut config = ProxyConfig::default();
    config.listener.host = "127.0.0.1".into();
    config.listener.port = 0;
    config.upstream.host = upstream.ip().to_string();
    config.upstream.port = upstream.port();
    config.tls.cert_path = fixtures.join("cert.pem");
    config.tls.key_path = fixtures.join("key.pem");
    config.timeouts.write_secs = 5;
    config.timeouts.shutdown_grace_secs = 5;
    config
}

/// A proxy running in the background.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub state: StateMachine,
    pub task: JoinHandle<Result<(), StartupError>>,
}

impl TestProxy {
    #[allow(dead_code)]
    pub fn url(&self, path: &str) -> String {
        format!("https://{}{}", self.addr, path)
    }
}

/// Initialize and serve a proxy, returning once it is listening.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let handle = ServerHandle::initialize(config).await.unwrap();
    let addr = handle.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let state = StateMachine::new();
    let task = tokio::spawn(handle.serve(shutdown.subscribe(), state.clone()));

    tokio::time::timeout(Duration::from_secs(5), state.reached(ServerState::Listening))
        .await
        .unwrap();

    TestProxy {
        addr,
        shutdown,
        state,
        task,
    }
}

/// HTTPS client that trusts the self-signed fixture certificate.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .use_rustls_tls()
        .danger_accept_invalid_certs(true)
        .no_proxy()
        .build()
        .unwrap()
}
