//! Budget enforcer for sandbox projects.
//!
//! This crate bundles the workspace crates behind one facade and hosts the
//! HTTP entrypoint that receives Pub/Sub notifications as CloudEvents.

#![warn(missing_docs, clippy::pedantic)]

pub mod bootstrap;
pub mod server;

/// Identifier newtypes and resource records.
pub use billing_primitives as primitives;

/// Remote service traits and REST clients.
pub use billing_adapters as adapters;

/// Pure enforcement decisions.
pub use billing_policy as policy;

/// Notification routing and enforcement procedures.
pub use billing_kernel as kernel;

/// Configuration management.
pub use billing_config as config;

/// Logging setup.
pub use billing_telemetry as telemetry;

pub use bootstrap::{build_enforcer, token_source};
pub use server::{router, serve};
