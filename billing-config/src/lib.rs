//! Configuration management for the enforcer.
//!
//! [`schema`] holds the typed configuration; [`loader`] fills it from the
//! environment.

#![warn(missing_docs, clippy::pedantic)]

pub mod loader;
pub mod schema;

use billing_adapters::traits::AdapterError;
use thiserror::Error;

pub use loader::{from_env, from_lookup};
pub use schema::{Credentials, EnforcerConfig};

/// Errors raised while building the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A setting has an unusable value.
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Environment variable holding the value.
        key: &'static str,
        /// Human-readable reason for rejection.
        reason: String,
    },
    /// An endpoint was rejected by the adapter layer.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
