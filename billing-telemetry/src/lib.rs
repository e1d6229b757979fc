//! Observability utilities for the enforcer.

#![warn(missing_docs, clippy::pedantic)]

pub mod tracing_support;

pub use tracing_support::{DEFAULT_FILTER, LogFormat, TelemetryError, init_tracing};
