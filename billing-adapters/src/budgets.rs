//! Cloud Billing Budgets API adapter.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use billing_primitives::{Budget, BudgetName, ProjectId};
use serde::Deserialize;

use crate::auth::TokenSource;
use crate::http_client::{ApiClient, ApiConfig};
use crate::traits::{AdapterError, AdapterResult, BudgetService};

/// Production endpoint of the Budgets API.
pub const DEFAULT_BUDGETS_URL: &str = "https://billingbudgets.googleapis.com/";

/// Reads budgets through `billingbudgets.googleapis.com/v1`.
pub struct BillingBudgetsClient {
    api: ApiClient,
}

impl fmt::Debug for BillingBudgetsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingBudgetsClient")
            .field("api", &self.api)
            .finish()
    }
}

impl BillingBudgetsClient {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`] if the HTTPS client cannot be built.
    pub fn new(config: ApiConfig, tokens: Arc<dyn TokenSource>) -> AdapterResult<Self> {
        Ok(Self {
            api: ApiClient::new("budgets", config, tokens)?,
        })
    }
}

#[async_trait]
impl BudgetService for BillingBudgetsClient {
    async fn get_budget(&self, name: &BudgetName) -> AdapterResult<Budget> {
        let uri = self.api.uri(&format!("v1/{name}"))?;
        let resource: BudgetResource = self.api.get_json(uri).await?;
        resource.into_budget()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BudgetResource {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    budget_filter: Option<BudgetFilter>,
}

#[derive(Debug, Default, Deserialize)]
struct BudgetFilter {
    #[serde(default)]
    projects: Vec<String>,
}

impl BudgetResource {
    fn into_budget(self) -> AdapterResult<Budget> {
        let projects = self
            .budget_filter
            .unwrap_or_default()
            .projects
            .into_iter()
            .map(|project| {
                ProjectId::new(project).map_err(|err| {
                    AdapterError::response(format!("budget {} lists {err}", self.name))
                })
            })
            .collect::<AdapterResult<Vec<_>>>()?;

        let budget = Budget::new(self.name, projects);
        Ok(match self.display_name {
            Some(display_name) => budget.with_display_name(display_name),
            None => budget,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(json: &str) -> AdapterResult<Budget> {
        serde_json::from_str::<BudgetResource>(json)
            .expect("wire format")
            .into_budget()
    }

    #[test]
    fn decodes_budget_filter_projects() {
        let budget = decode(
            r#"{
                "name": "billingAccounts/B1/budgets/b1",
                "displayName": "sandbox-alice",
                "budgetFilter": {"projects": ["projects/123456789"], "creditTypesTreatment": "INCLUDE_ALL_CREDITS"},
                "amount": {"specifiedAmount": {"currencyCode": "EUR", "units": "100"}}
            }"#,
        )
        .unwrap();

        assert_eq!(budget.name(), "billingAccounts/B1/budgets/b1");
        assert_eq!(budget.display_name(), Some("sandbox-alice"));
        assert_eq!(budget.projects(), &[ProjectId::new("123456789").unwrap()]);
    }

    #[test]
    fn missing_filter_yields_no_projects() {
        let budget = decode(r#"{"name": "billingAccounts/B1/budgets/b2"}"#).unwrap();
        assert!(budget.projects().is_empty());
    }

    #[test]
    fn invalid_project_reference_is_a_response_error() {
        let err = decode(r#"{"name": "n", "budgetFilter": {"projects": ["projects/"]}}"#)
            .expect_err("empty project");
        assert!(matches!(err, AdapterError::Response { .. }));
    }
}
