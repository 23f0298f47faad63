//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration for the reverse proxy.
///
/// The six connection inputs (listen host/port, upstream host/port,
/// certificate and key) have no meaningful defaults: empty strings and
/// zero ports count as missing and are rejected by validation.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Where the TLS listener binds.
    pub listener: ListenerConfig,

    /// The single backend that receives every request.
    pub upstream: UpstreamConfig,

    /// Certificate and private key for the listener.
    pub tls: TlsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// `host:port` the listener binds to.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.listener.host, self.listener.port)
    }

    /// `host:port` of the upstream.
    pub fn upstream_address(&self) -> String {
        format!("{}:{}", self.upstream.host, self.upstream.port)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host address to listen on (e.g., "0.0.0.0").
    pub host: String,

    /// Port to listen on.
    pub port: u16,
}

/// Upstream (backend) configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Host to proxy requests to.
    pub host: String,

    /// Port to proxy requests to.
    pub port: u16,
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed for a client to send request headers.
    pub read_secs: u64,

    /// Time allowed for the upstream to produce response headers.
    pub write_secs: u64,

    /// Idle lifetime of pooled upstream connections.
    pub idle_secs: u64,

    /// Grace period for in-flight exchanges during shutdown.
    pub shutdown_grace_secs: u64,
}

impl TimeoutConfig {
    pub fn read(&self) -> Duration {
        Duration::from_secs(self.read_secs)
    }

    pub fn write(&self) -> Duration {
        Duration::from_secs(self.write_secs)
    }

    pub fn idle(&self) -> Duration {
        Duration::from_secs(self.idle_secs)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 15,
            write_secs: 15,
            idle_secs: 60,
            shutdown_grace_secs: 15,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
