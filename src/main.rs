//! TLS-Terminating Reverse Proxy
//!
//! Accepts HTTPS connections, decrypts them with the configured
//! certificate/key pair and forwards every request to one plain-HTTP
//! upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────┐
//!                     │               TLS REVERSE PROXY              │
//!   Client (HTTPS)    │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!  ───────────────────┼─▶│  net    │──▶│  http    │──▶│  request  │  │
//!                     │  │tls+bind │   │  server  │   │ director  │  │
//!                     │  └─────────┘   └──────────┘   └─────┬─────┘  │
//!                     │                                     ▼        │
//!   Client Response   │  ┌──────────┐   ┌──────────┐   ┌──────────┐  │
//!  ◀──────────────────┼──│ response │◀──│  engine  │◀──│ upstream │◀─┼── Upstream
//!                     │  │ rewriter │   │ (502 on  │   │  client  │  │   (HTTP)
//!                     │  └──────────┘   │ failure) │   └──────────┘  │
//!                     │                 └──────────┘                 │
//!                     │  config · lifecycle · observability          │
//!                     └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::process::ExitCode;

use tls_reverse_proxy::config::{missing_flags, resolve_config, CliArgs, ConfigError, ValidationError};
use tls_reverse_proxy::lifecycle::{self, signals, Shutdown, StateMachine};
use tls_reverse_proxy::observability::init_logging;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match resolve_config(&args) {
        Ok(config) => config,
        Err(ConfigError::Validation(errors)) => {
            let missing = missing_flags(&errors);
            if !missing.is_empty() {
                eprintln!("Error: missing required flags: {:?}\n", missing);
            }
            for error in errors.iter().filter(|e| !matches!(e, ValidationError::Missing(_))) {
                eprintln!("Error: {}", error);
            }
            eprintln!("{}", CliArgs::usage());
            return ExitCode::FAILURE;
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    tracing::info!(
        listen = %config.listen_address(),
        upstream = %config.upstream_address(),
        "tls-reverse-proxy v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::forward_signals(shutdown));

    match lifecycle::run(config, server_shutdown, StateMachine::new()).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}
