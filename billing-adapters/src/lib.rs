//! Service adapters for the Google Cloud APIs the enforcer talks to.
//!
//! Each module exposes a client for a specific API while sharing the
//! trait-based interface defined in [`traits`], so the procedures can run
//! against in-memory fakes in tests.

#![warn(missing_docs, clippy::pedantic)]

pub mod auth;
pub mod budgets;
pub mod cloudbilling;
pub mod resource_manager;
pub mod traits;

mod http_client;

pub use http_client::{ApiConfig, DEFAULT_TIMEOUT};
