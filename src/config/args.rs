//! Command-line arguments.
//!
//! Every field is optional at the clap level so that a config file can
//! supply it instead; required-ness is enforced after merging by
//! [`validate_config`](crate::config::validation::validate_config).

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

use crate::config::schema::{LogFormat, ProxyConfig};

/// TLS-terminating reverse proxy for a single upstream.
#[derive(Debug, Clone, Default, Parser)]
#[command(name = "tls-reverse-proxy", version)]
#[command(about = "Terminates TLS and forwards every request to one plain-HTTP upstream")]
#[command(after_help = EXAMPLE)]
pub struct CliArgs {
    /// Host address to listen on (required)
    #[arg(long, env = "TLS_PROXY_HOST")]
    pub host: Option<String>,

    /// Port to listen on (required)
    #[arg(long, env = "TLS_PROXY_PORT")]
    pub port: Option<u16>,

    /// Host to proxy requests to (required)
    #[arg(long = "proxy-for-host", env = "TLS_PROXY_FOR_HOST")]
    pub proxy_for_host: Option<String>,

    /// Port to proxy requests to (required)
    #[arg(long = "proxy-for-port", env = "TLS_PROXY_FOR_PORT")]
    pub proxy_for_port: Option<u16>,

    /// Path to TLS certificate file (required)
    #[arg(long, env = "TLS_PROXY_CERT")]
    pub cert: Option<PathBuf>,

    /// Path to TLS key file (required)
    #[arg(long, env = "TLS_PROXY_KEY")]
    pub key: Option<PathBuf>,

    /// Optional TOML file; flags override its values
    #[arg(long, env = "TLS_PROXY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

const EXAMPLE: &str = "Example:\n  tls-reverse-proxy --host 0.0.0.0 --port 443 --proxy-for-host 127.0.0.1 --proxy-for-port 8443 --cert cert.crt --key key.pem";

impl CliArgs {
    /// Overlay the values given on the command line onto `config`.
    pub fn apply(&self, config: &mut ProxyConfig) {
        if let Some(host) = &self.host {
            config.listener.host = host.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(host) = &self.proxy_for_host {
            config.upstream.host = host.clone();
        }
        if let Some(port) = self.proxy_for_port {
            config.upstream.port = port;
        }
        if let Some(cert) = &self.cert {
            config.tls.cert_path = cert.clone();
        }
        if let Some(key) = &self.key {
            config.tls.key_path = key.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }

    /// Full help text, printed after a missing-flags error.
    pub fn usage() -> String {
        Self::command().render_help().to_string()
    }
}
