//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load TLS material → Bind listener → Build engine → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//!
//! State (state.rs):
//!     Initializing → Listening → Draining → Stopped
//! ```
//!
//! # Design Decisions
//! - Ordered startup: TLS first, then listener, then serving
//! - Shutdown is passed explicitly, never held in a global
//! - Shutdown has timeout: forced close after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::{DrainReason, Shutdown, ShutdownSignal};
pub use startup::{run, ServerHandle, StartupError};
pub use state::{ServerState, StateMachine};
