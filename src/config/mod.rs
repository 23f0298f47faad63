//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → args.rs (command-line flags override file values)
//!     → validation.rs (every required input present, sane timeouts)
//!     → ProxyConfig (validated, immutable)
//!     → handed to lifecycle::startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - Connection inputs have no defaults; timeouts and logging do
//! - Validation separates syntactic (serde/clap) from semantic checks

pub mod args;
pub mod loader;
pub mod schema;
pub mod validation;

pub use args::CliArgs;
pub use loader::{load_config, resolve_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, ObservabilityConfig, ProxyConfig, TimeoutConfig, TlsConfig,
    UpstreamConfig,
};
pub use validation::{missing_flags, validate_config, ValidationError};
