//! Service traits for the remote collaborators and their shared error type.

use async_trait::async_trait;
use billing_primitives::{
    BillingAccountId, Budget, BudgetName, FolderId, ProjectBillingInfo, ProjectId, ProjectSummary,
};
use thiserror::Error;

/// Result alias used by service adapters.
pub type AdapterResult<T> = Result<T, AdapterError>;

/// Error type shared by adapter implementations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Adapter is misconfigured.
    #[error("adapter not configured: {reason}")]
    Configuration {
        /// Additional context for the failure.
        reason: String,
    },

    /// An access token could not be obtained.
    #[error("authentication failed: {reason}")]
    Authentication {
        /// Additional context for the failure.
        reason: String,
    },

    /// Transport-level failures (network, protocol, timeouts).
    #[error("adapter transport error: {reason}")]
    Transport {
        /// Additional context about the error.
        reason: String,
    },

    /// The service answered with a non-success status.
    #[error("service returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned by the service.
        body: String,
    },

    /// The service returned a malformed response.
    #[error("adapter response error: {reason}")]
    Response {
        /// Additional context about the response failure.
        reason: String,
    },
}

impl AdapterError {
    /// Convenience constructor for configuration issues.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for token failures.
    #[must_use]
    pub fn authentication(reason: impl Into<String>) -> Self {
        Self::Authentication {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for transport failures.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Convenience constructor for malformed responses.
    #[must_use]
    pub fn response(reason: impl Into<String>) -> Self {
        Self::Response {
            reason: reason.into(),
        }
    }
}

/// Budget Query Service.
#[async_trait]
pub trait BudgetService: Send + Sync {
    /// Fetches the budget identified by `name`.
    async fn get_budget(&self, name: &BudgetName) -> AdapterResult<Budget>;
}

/// Billing Info Service.
#[async_trait]
pub trait BillingInfoService: Send + Sync {
    /// Fetches the current billing association of `project`.
    async fn get_billing_info(&self, project: &ProjectId) -> AdapterResult<ProjectBillingInfo>;

    /// Links `project` to `account`, or detaches it from billing when `account`
    /// is `None`.
    async fn update_billing_info(
        &self,
        project: &ProjectId,
        account: Option<&BillingAccountId>,
    ) -> AdapterResult<ProjectBillingInfo>;
}

/// Project Directory Service.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Lists every project whose parent is `folder`, in service order.
    async fn list_folder_projects(&self, folder: &FolderId) -> AdapterResult<Vec<ProjectSummary>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_carries_body() {
        let err = AdapterError::Status {
            status: 403,
            body: "permission denied".into(),
        };
        assert_eq!(err.to_string(), "service returned 403: permission denied");
    }

    #[test]
    fn constructors_pick_variants() {
        assert!(matches!(
            AdapterError::authentication("no token"),
            AdapterError::Authentication { .. }
        ));
        assert!(matches!(
            AdapterError::response("bad json"),
            AdapterError::Response { .. }
        ));
    }
}
