//! Errors surfaced while handling a notification.

use std::fmt;

use billing_adapters::traits::AdapterError;
use billing_primitives::ProjectId;
use thiserror::Error;

/// Which decoding layer rejected the inbound event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeLayer {
    /// The push envelope around the Pub/Sub message.
    Envelope,
    /// The JSON document carried in the message `data`.
    Payload,
}

impl fmt::Display for DecodeLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Envelope => "message envelope",
            Self::Payload => "message data",
        })
    }
}

/// Errors that abort the handling of a notification.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The inbound event could not be decoded.
    #[error("failed to decode {layer}: {source}")]
    Decode {
        /// Layer that failed.
        layer: DecodeLayer,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// A required message attribute or payload field is absent or empty.
    #[error("required field `{field}` is missing")]
    MissingField {
        /// Wire name of the field.
        field: &'static str,
    },

    /// A field is present but is not a valid resource identifier.
    #[error("field `{field}` is invalid: {source}")]
    InvalidField {
        /// Wire name of the field.
        field: &'static str,
        /// Validation failure.
        #[source]
        source: billing_primitives::Error,
    },

    /// The budget covers several projects, so the one over budget is unknown.
    #[error(
        "budget {budget} covers {count} projects, cannot decide which of them hit the threshold",
        count = .projects.len()
    )]
    AmbiguousProject {
        /// Budget resource name.
        budget: String,
        /// Projects listed in the budget filter.
        projects: Vec<ProjectId>,
    },

    /// The budget filter does not name any project.
    #[error("budget {budget} is not scoped to a project")]
    UnscopedBudget {
        /// Budget resource name.
        budget: String,
    },

    /// Reading remote state failed.
    #[error("failed to {operation} {resource}: {source}")]
    RemoteFetch {
        /// Operation that was attempted.
        operation: &'static str,
        /// Identifier of the resource involved.
        resource: String,
        /// Adapter failure.
        #[source]
        source: AdapterError,
    },

    /// Mutating remote state failed.
    #[error("failed to {operation} {resource}: {source}")]
    RemoteMutate {
        /// Operation that was attempted.
        operation: &'static str,
        /// Identifier of the resource involved.
        resource: String,
        /// Adapter failure.
        #[source]
        source: AdapterError,
    },
}

impl HandlerError {
    pub(crate) fn payload(source: serde_json::Error) -> Self {
        Self::Decode {
            layer: DecodeLayer::Payload,
            source,
        }
    }

    pub(crate) fn fetch(
        operation: &'static str,
        resource: impl fmt::Display,
    ) -> impl FnOnce(AdapterError) -> Self {
        let resource = resource.to_string();
        move |source| Self::RemoteFetch {
            operation,
            resource,
            source,
        }
    }

    pub(crate) fn mutate(
        operation: &'static str,
        resource: impl fmt::Display,
    ) -> impl FnOnce(AdapterError) -> Self {
        let resource = resource.to_string();
        move |source| Self::RemoteMutate {
            operation,
            resource,
            source,
        }
    }

    /// Returns true when the event itself is at fault, so redelivering it
    /// cannot succeed.
    #[must_use]
    pub fn is_malformed_event(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::MissingField { .. } | Self::InvalidField { .. }
        )
    }
}

/// Result alias for notification handling.
pub type HandlerResult<T = ()> = Result<T, HandlerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_project_message_counts_projects() {
        let err = HandlerError::AmbiguousProject {
            budget: "billingAccounts/B1/budgets/b1".into(),
            projects: vec![ProjectId::new("p1").unwrap(), ProjectId::new("p2").unwrap()],
        };
        assert_eq!(
            err.to_string(),
            "budget billingAccounts/B1/budgets/b1 covers 2 projects, cannot decide which of them hit the threshold"
        );
        assert!(!err.is_malformed_event());
    }

    #[test]
    fn remote_errors_name_operation_and_resource() {
        let err = HandlerError::fetch("get billing info for", "projects/p1")(
            AdapterError::transport("connection reset"),
        );
        assert_eq!(
            err.to_string(),
            "failed to get billing info for projects/p1: adapter transport error: connection reset"
        );
    }

    #[test]
    fn malformed_event_classification() {
        assert!(HandlerError::MissingField { field: "budgetId" }.is_malformed_event());
        let mutate = HandlerError::mutate("update billing info for", "projects/p1")(
            AdapterError::Status {
                status: 500,
                body: String::new(),
            },
        );
        assert!(!mutate.is_malformed_event());
    }
}
