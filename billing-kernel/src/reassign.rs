//! Reassign-billing procedure run on the scheduler trigger.

use billing_adapters::traits::{BillingInfoService, ProjectDirectory};
use billing_policy::decide_reassignment;
use billing_primitives::{BillingAccountId, FolderId, ProjectId};
use tracing::{debug, info};

use crate::disable::required;
use crate::envelope::{BILLING_ACCOUNT_ID_ATTRIBUTE, MessageAttributes, ReassignmentTrigger};
use crate::error::{HandlerError, HandlerResult};

const SANDBOX_FOLDER_ID_FIELD: &str = "sandboxFolderId";

/// What the reassign procedure did, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReassignOutcome {
    reassigned: Vec<ProjectId>,
    already_enabled: Vec<ProjectId>,
}

impl ReassignOutcome {
    /// Projects that were linked back to the billing account.
    #[must_use]
    pub fn reassigned(&self) -> &[ProjectId] {
        &self.reassigned
    }

    /// Projects that needed no change.
    #[must_use]
    pub fn already_enabled(&self) -> &[ProjectId] {
        &self.already_enabled
    }
}

/// Links every project under the sandbox folder back to the billing account
/// if its billing is currently disabled.
///
/// Projects are processed one at a time in listing order. The first failure
/// aborts the run; projects handled before it keep their new state.
///
/// # Errors
///
/// - [`HandlerError::MissingField`] / [`HandlerError::InvalidField`] when the
///   billing account attribute or the folder is absent or malformed.
/// - [`HandlerError::RemoteFetch`] when listing projects or reading billing
///   info fails.
/// - [`HandlerError::RemoteMutate`] when updating a project fails.
pub async fn reassign_billing(
    directory: &dyn ProjectDirectory,
    billing: &dyn BillingInfoService,
    attributes: &MessageAttributes,
    trigger: &ReassignmentTrigger,
) -> HandlerResult<ReassignOutcome> {
    let account = required(attributes.billing_account_id(), BILLING_ACCOUNT_ID_ATTRIBUTE)?;
    let account = BillingAccountId::new(account).map_err(|source| HandlerError::InvalidField {
        field: BILLING_ACCOUNT_ID_ATTRIBUTE,
        source,
    })?;
    let folder = required(trigger.sandbox_folder_id(), SANDBOX_FOLDER_ID_FIELD)?;
    let folder = FolderId::new(folder).map_err(|source| HandlerError::InvalidField {
        field: SANDBOX_FOLDER_ID_FIELD,
        source,
    })?;

    let projects = directory
        .list_folder_projects(&folder)
        .await
        .map_err(HandlerError::fetch("list projects in folder", &folder))?;
    info!(folder = %folder, count = projects.len(), "checking sandbox projects");

    let mut outcome = ReassignOutcome::default();
    for summary in projects {
        let project = summary.project_id();
        debug!(
            project = %project,
            project_number = summary.project_number().unwrap_or("-"),
            lifecycle_state = summary.lifecycle_state().unwrap_or("-"),
            "checking billing"
        );
        let current = billing
            .get_billing_info(project)
            .await
            .map_err(HandlerError::fetch("get billing info for", project.resource_name()))?;

        let decision = decide_reassignment(&current);
        if decision.is_keep() {
            info!(project = %project, reason = decision.reason(), "no action needed");
            outcome.already_enabled.push(project.clone());
            continue;
        }

        billing
            .update_billing_info(project, Some(&account))
            .await
            .map_err(HandlerError::mutate("re-enable billing for", project.resource_name()))?;

        info!(
            project = %project,
            account = %account.resource_name(),
            decision = ?decision.kind(),
            reason = decision.reason(),
            "re-enabled billing"
        );
        outcome.reassigned.push(project.clone());
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_starts_empty() {
        let outcome = ReassignOutcome::default();
        assert!(outcome.reassigned().is_empty());
        assert!(outcome.already_enabled().is_empty());
    }
}
