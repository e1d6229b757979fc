//! Cloud Billing API adapter for project billing associations.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use billing_primitives::{BillingAccountId, ProjectBillingInfo, ProjectId};
use serde::{Deserialize, Serialize};

use crate::auth::TokenSource;
use crate::http_client::{ApiClient, ApiConfig};
use crate::traits::{AdapterResult, BillingInfoService};

/// Production endpoint of the Cloud Billing API.
pub const DEFAULT_BILLING_URL: &str = "https://cloudbilling.googleapis.com/";

/// Reads and updates `projects/*/billingInfo` through `cloudbilling.googleapis.com/v1`.
pub struct CloudBillingClient {
    api: ApiClient,
}

impl fmt::Debug for CloudBillingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudBillingClient")
            .field("api", &self.api)
            .finish()
    }
}

impl CloudBillingClient {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError`](crate::traits::AdapterError) if the HTTPS
    /// client cannot be built.
    pub fn new(config: ApiConfig, tokens: Arc<dyn TokenSource>) -> AdapterResult<Self> {
        Ok(Self {
            api: ApiClient::new("cloudbilling", config, tokens)?,
        })
    }

    fn billing_info_path(project: &ProjectId) -> String {
        format!("v1/{}/billingInfo", project.resource_name())
    }
}

#[async_trait]
impl BillingInfoService for CloudBillingClient {
    async fn get_billing_info(&self, project: &ProjectId) -> AdapterResult<ProjectBillingInfo> {
        let uri = self.api.uri(&Self::billing_info_path(project))?;
        let resource: BillingInfoResource = self.api.get_json(uri).await?;
        Ok(resource.into())
    }

    async fn update_billing_info(
        &self,
        project: &ProjectId,
        account: Option<&BillingAccountId>,
    ) -> AdapterResult<ProjectBillingInfo> {
        let uri = self.api.uri(&Self::billing_info_path(project))?;
        let body = BillingInfoUpdate::new(account);
        let resource: BillingInfoResource = self.api.put_json(uri, &body).await?;
        Ok(resource.into())
    }
}

// proto3 JSON omits empty strings and false booleans.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BillingInfoResource {
    #[serde(default)]
    billing_account_name: String,
    #[serde(default)]
    billing_enabled: bool,
}

impl From<BillingInfoResource> for ProjectBillingInfo {
    fn from(value: BillingInfoResource) -> Self {
        ProjectBillingInfo::new(value.billing_account_name, value.billing_enabled)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BillingInfoUpdate {
    billing_account_name: String,
}

impl BillingInfoUpdate {
    fn new(account: Option<&BillingAccountId>) -> Self {
        Self {
            billing_account_name: account
                .map(BillingAccountId::resource_name)
                .unwrap_or_default(),
        }
    }
}
