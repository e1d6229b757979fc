//! Wires configuration into live service clients.

use std::sync::Arc;
use std::time::Duration;

use billing_adapters::auth::{MetadataTokenSource, StaticTokenSource, TokenSource};
use billing_adapters::budgets::BillingBudgetsClient;
use billing_adapters::cloudbilling::CloudBillingClient;
use billing_adapters::resource_manager::ResourceManagerClient;
use billing_adapters::traits::AdapterResult;
use billing_config::{Credentials, EnforcerConfig};
use billing_kernel::BillingEnforcer;
use tracing::info;

/// Builds the token source described by `credentials`.
///
/// `timeout` bounds each metadata server request.
///
/// # Errors
///
/// Returns a configuration error for an empty token or a bad metadata URL.
pub fn token_source(
    credentials: &Credentials,
    timeout: Duration,
) -> AdapterResult<Arc<dyn TokenSource>> {
    match credentials {
        Credentials::AccessToken(token) => {
            info!("using static access token");
            Ok(Arc::new(StaticTokenSource::new(token.clone())?))
        }
        Credentials::MetadataServer { url } => {
            info!(metadata_url = %url, ?timeout, "using metadata server credentials");
            Ok(Arc::new(MetadataTokenSource::new(url)?.with_timeout(timeout)))
        }
    }
}

/// Builds an enforcer backed by the Google Cloud REST clients.
///
/// # Errors
///
/// Returns an error when the token source or an HTTP client cannot be built.
pub fn build_enforcer(config: &EnforcerConfig) -> AdapterResult<BillingEnforcer> {
    let tokens = token_source(config.credentials(), config.metadata_timeout())?;

    let budgets = BillingBudgetsClient::new(config.budgets().clone(), Arc::clone(&tokens))?;
    let billing = CloudBillingClient::new(config.billing().clone(), Arc::clone(&tokens))?;
    let projects = ResourceManagerClient::new(config.resource_manager().clone(), tokens)?;

    Ok(BillingEnforcer::new(
        Arc::new(budgets),
        Arc::new(billing),
        Arc::new(projects),
    ))
}
