//! Core identifier and resource types shared by the budget enforcement crates.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod resources;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Validated resource identifiers.
pub use ids::{BillingAccountId, BudgetId, BudgetName, FolderId, ProjectId};
/// Snapshots of remote resources.
pub use resources::{Budget, ProjectBillingInfo, ProjectSummary};
