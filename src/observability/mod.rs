//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events and spans (one span per exchange, with request id)
//!
//! Consumers:
//!     → logging.rs (stdout, pretty or JSON)
//! ```

pub mod logging;

pub use logging::init_logging;
