//! Server lifecycle state machine.
//!
//! # States
//! ```text
//! Initializing → Listening → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Transitions only move forward; each state is entered at most once
//! - Backed by a watch channel so observers can await a state
//! - State changes logged for observability

use std::sync::Arc;
use tokio::sync::watch;

/// Where the server is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ServerState {
    /// Loading TLS material, binding, building the engine.
    Initializing,
    /// Accepting connections.
    Listening,
    /// No new connections; in-flight exchanges finishing.
    Draining,
    /// Terminal.
    Stopped,
}

/// Shared handle on the current [`ServerState`].
#[derive(Debug, Clone)]
pub struct StateMachine {
    tx: Arc<watch::Sender<ServerState>>,
}

impl StateMachine {
    /// Start in [`ServerState::Initializing`].
    pub fn new() -> Self {
        let (tx, _) = watch::channel(ServerState::Initializing);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> ServerState {
        *self.tx.borrow()
    }

    /// Move to `next` if it lies ahead of the current state.
    /// Returns whether a transition happened.
    pub fn advance(&self, next: ServerState) -> bool {
        self.tx.send_if_modified(|current| {
            if next > *current {
                tracing::debug!(from = ?*current, to = ?next, "Server state changed");
                *current = next;
                true
            } else {
                false
            }
        })
    }

    /// Wait until the server has reached `state` (or gone past it).
    pub async fn reached(&self, state: ServerState) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = rx.wait_for(|current| *current >= state).await;
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
