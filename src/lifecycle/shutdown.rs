//! Drain coordination.
//!
//! One [`Shutdown`] is created at startup and cloned to whoever may ask
//! the proxy to stop (signal forwarding, tests). The server holds a
//! [`ShutdownSignal`] and starts draining when it resolves.

use std::fmt;
use tokio::sync::broadcast::{self, error::RecvError};

/// Why the proxy started draining.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainReason {
    /// An OS signal arrived.
    Signal(&'static str),
    /// Requested in-process.
    Requested,
    /// Every coordinator was dropped; nothing can ask to stop any more.
    Abandoned,
}

impl fmt::Display for DrainReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DrainReason::Signal(name) => write!(f, "signal {}", name),
            DrainReason::Requested => f.write_str("requested"),
            DrainReason::Abandoned => f.write_str("coordinator dropped"),
        }
    }
}

/// Sending side: asks every subscribed server to drain.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<DrainReason>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe before triggering; a later subscriber misses the request.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Ask subscribers to drain.
    pub fn trigger(&self) {
        self.trigger_with(DrainReason::Requested);
    }

    pub fn trigger_with(&self, reason: DrainReason) {
        // No subscribers means nothing is serving yet.
        let _ = self.tx.send(reason);
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side held by a server.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: broadcast::Receiver<DrainReason>,
}

impl ShutdownSignal {
    /// Resolve once draining should start.
    pub async fn recv(&mut self) -> DrainReason {
        loop {
            match self.rx.recv().await {
                Ok(reason) => return reason,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => return DrainReason::Abandoned,
            }
        }
    }
}
