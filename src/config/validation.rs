//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and clap handle syntactic)
//! - Report every missing required input by its flag name
//! - Validate value ranges (timeouts > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use crate::config::schema::ProxyConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required input was not supplied. Holds the flag name.
    #[error("missing required flag: {0}")]
    Missing(&'static str),

    /// A timeout was configured as zero.
    #[error("timeout `{0}` must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate a fully merged configuration.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.host.trim().is_empty() {
        errors.push(ValidationError::Missing("host"));
    }
    if config.listener.port == 0 {
        errors.push(ValidationError::Missing("port"));
    }
    if config.upstream.host.trim().is_empty() {
        errors.push(ValidationError::Missing("proxy-for-host"));
    }
    if config.upstream.port == 0 {
        errors.push(ValidationError::Missing("proxy-for-port"));
    }
    if config.tls.cert_path.as_os_str().is_empty() {
        errors.push(ValidationError::Missing("cert"));
    }
    if config.tls.key_path.as_os_str().is_empty() {
        errors.push(ValidationError::Missing("key"));
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("read_secs", timeouts.read_secs),
        ("write_secs", timeouts.write_secs),
        ("idle_secs", timeouts.idle_secs),
        ("shutdown_grace_secs", timeouts.shutdown_grace_secs),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Flag names of every missing required input, in declaration order.
pub fn missing_flags(errors: &[ValidationError]) -> Vec<&'static str> {
    errors
        .iter()
        .filter_map(|e| match e {
            ValidationError::Missing(flag) => Some(*flag),
            _ => None,
        })
        .collect()
}
