//! Upstream selection subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig.upstream
//!     → target.rs (UpstreamTarget built once at startup)
//!     → FixedUpstream (TargetResolver)
//!     → consulted by the proxy engine for every request
//! ```

pub mod target;

pub use target::{FixedUpstream, TargetResolver, UpstreamTarget};
