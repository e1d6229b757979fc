//! Disable-billing procedure for a project whose budget fired.

use billing_adapters::traits::{BillingInfoService, BudgetService};
use billing_policy::decide_over_budget;
use billing_primitives::{BillingAccountId, BudgetId, BudgetName, ProjectId};
use tracing::{info, warn};

use crate::envelope::{
    BILLING_ACCOUNT_ID_ATTRIBUTE, BUDGET_ID_ATTRIBUTE, BudgetAlert, MessageAttributes,
};
use crate::error::{HandlerError, HandlerResult};

/// What the disable procedure did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisableOutcome {
    /// Cost is below the budget; nothing was fetched or changed.
    WithinBudget {
        /// Project covered by the budget.
        project: ProjectId,
    },
    /// Over budget, but billing was already detached.
    AlreadyDisabled {
        /// Project covered by the budget.
        project: ProjectId,
    },
    /// Billing was detached from the project.
    Disabled {
        /// Project covered by the budget.
        project: ProjectId,
    },
}

impl DisableOutcome {
    /// Returns the project the budget covers.
    #[must_use]
    pub fn project(&self) -> &ProjectId {
        match self {
            Self::WithinBudget { project }
            | Self::AlreadyDisabled { project }
            | Self::Disabled { project } => project,
        }
    }
}

/// Detaches billing from the budget's project once its cost reaches the
/// budget.
///
/// At most one mutation is issued, and none when billing is already detached.
///
/// # Errors
///
/// - [`HandlerError::MissingField`] / [`HandlerError::InvalidField`] for bad
///   attributes, before any remote call.
/// - [`HandlerError::AmbiguousProject`] / [`HandlerError::UnscopedBudget`]
///   when the budget does not map to exactly one project.
/// - [`HandlerError::RemoteFetch`] / [`HandlerError::RemoteMutate`] for
///   service failures.
pub async fn disable_billing(
    budgets: &dyn BudgetService,
    billing: &dyn BillingInfoService,
    attributes: &MessageAttributes,
    alert: &BudgetAlert,
) -> HandlerResult<DisableOutcome> {
    let budget_name = budget_name(attributes)?;

    let budget = budgets
        .get_budget(&budget_name)
        .await
        .map_err(HandlerError::fetch("get budget", &budget_name))?;

    let project = match budget.projects() {
        [project] => project.clone(),
        [] => {
            return Err(HandlerError::UnscopedBudget {
                budget: budget_name.to_string(),
            });
        }
        projects => {
            return Err(HandlerError::AmbiguousProject {
                budget: budget_name.to_string(),
                projects: projects.to_vec(),
            });
        }
    };

    let spend = alert.spend();
    let used_percent = format!("{:.2}", spend.used_percent());
    let display_name = alert
        .budget_display_name()
        .or_else(|| budget.display_name())
        .unwrap_or("-");
    info!(
        project = %project,
        budget = %budget_name,
        budget_display_name = display_name,
        "comparing costs and budget"
    );

    if !spend.exceeds_budget() {
        info!(
            project = %project,
            used_percent = %used_percent,
            budget_display_name = display_name,
            "no action needed, project is within budget"
        );
        return Ok(DisableOutcome::WithinBudget { project });
    }

    warn!(
        project = %project,
        used_percent = %used_percent,
        budget_display_name = display_name,
        threshold = ?alert.alert_threshold_exceeded(),
        interval_start = alert.cost_interval_start().unwrap_or("-"),
        currency = alert.currency_code().unwrap_or("-"),
        "project has exceeded cost threshold"
    );

    let current = billing
        .get_billing_info(&project)
        .await
        .map_err(HandlerError::fetch("get billing info for", project.resource_name()))?;

    let decision = decide_over_budget(&current);
    if decision.is_keep() {
        info!(project = %project, reason = decision.reason(), "no mutation issued");
        return Ok(DisableOutcome::AlreadyDisabled { project });
    }

    billing
        .update_billing_info(&project, None)
        .await
        .map_err(HandlerError::mutate("disable billing for", project.resource_name()))?;

    info!(
        project = %project,
        decision = ?decision.kind(),
        reason = decision.reason(),
        "disabled billing"
    );
    Ok(DisableOutcome::Disabled { project })
}

fn budget_name(attributes: &MessageAttributes) -> HandlerResult<BudgetName> {
    let account = required(attributes.billing_account_id(), BILLING_ACCOUNT_ID_ATTRIBUTE)?;
    let budget = required(attributes.budget_id(), BUDGET_ID_ATTRIBUTE)?;

    let account = BillingAccountId::new(account).map_err(|source| HandlerError::InvalidField {
        field: BILLING_ACCOUNT_ID_ATTRIBUTE,
        source,
    })?;
    let budget = BudgetId::new(budget).map_err(|source| HandlerError::InvalidField {
        field: BUDGET_ID_ATTRIBUTE,
        source,
    })?;

    Ok(BudgetName::new(account, budget))
}

pub(crate) fn required<'a>(value: &'a str, field: &'static str) -> HandlerResult<&'a str> {
    if value.is_empty() {
        Err(HandlerError::MissingField { field })
    } else {
        Ok(value)
    }
}
