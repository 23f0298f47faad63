//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection
//!     → server.rs (Axum setup, every request to the proxy handler)
//!     → request.rs (strip hop-by-hop, direct to upstream, X-Forwarded-*)
//!     → upstream over plain HTTP/1.1
//!     → response.rs (Content-Type correction)
//!     → Send to client
//!
//! On 101 Switching Protocols:
//!     → upgrade.rs (byte tunnel between client and upstream)
//!
//! On upstream failure:
//!     → error.rs (502 Bad Gateway)
//! ```

pub mod error;
pub mod request;
pub mod response;
pub mod server;
pub mod upgrade;

pub use error::{bad_gateway, ProxyError};
pub use server::{AppState, HttpServer};
