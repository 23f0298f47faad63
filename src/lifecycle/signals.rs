//! OS signal handling.
//!
//! # Responsibilities
//! - Wait for SIGINT (Ctrl+C) or, on Unix, SIGTERM
//! - Report which signal arrived so the caller can start draining

use std::io;

use crate::lifecycle::{DrainReason, Shutdown};

/// Resolve once an interrupt or termination signal arrives.
///
/// Returns the signal name. Fails only if a handler cannot be installed.
pub async fn wait_for_signal() -> io::Result<&'static str> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| "SIGINT"),
            _ = terminate.recv() => Ok("SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| "Ctrl+C")
    }
}

/// Trigger `shutdown` when a signal arrives.
///
/// If handlers cannot be installed the error is logged and the process
/// keeps serving; it can still be stopped by other means.
pub async fn forward_signals(shutdown: Shutdown) {
    match wait_for_signal().await {
        Ok(signal) => {
            tracing::info!(signal, "Shutdown signal received");
            shutdown.trigger_with(DrainReason::Signal(signal));
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install signal handlers");
            std::future::pending::<()>().await;
        }
    }
}
