//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → tls.rs (certificate + key → rustls config, fatal on error)
//!     → listener.rs (bind host:port, fatal on error)
//!     → Hand both to the HTTP layer, which accepts and handshakes
//! ```
//!
//! # Design Decisions
//! - Both steps run before serving so misconfiguration fails fast
//! - TLS material is read-only once loaded and shared by all connections

pub mod listener;
pub mod tls;

pub use listener::{bind, ListenerError};
pub use tls::{load_tls_config, TlsError};
