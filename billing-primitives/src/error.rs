//! Shared error definitions for billing primitives.

use thiserror::Error;

/// Result alias used throughout the enforcer.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while constructing primitive types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A resource identifier failed validation.
    #[error("invalid {kind} id `{id}`: {reason}")]
    InvalidId {
        /// Kind of resource the identifier refers to.
        kind: &'static str,
        /// The offending identifier string.
        id: String,
        /// Human-readable reason for rejection.
        reason: String,
    },
}
