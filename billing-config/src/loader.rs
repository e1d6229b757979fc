//! Environment-based configuration loader.

use std::env;
use std::time::Duration;

use tracing::debug;

use crate::schema::{Credentials, EnforcerConfig};
use crate::{ConfigError, ConfigResult};

/// Overrides the Budgets API base URL.
pub const BUDGETS_URL_ENV: &str = "BUDGET_POLICE_BUDGETS_URL";
/// Overrides the Cloud Billing API base URL.
pub const BILLING_URL_ENV: &str = "BUDGET_POLICE_BILLING_URL";
/// Overrides the Resource Manager API base URL.
pub const RESOURCE_MANAGER_URL_ENV: &str = "BUDGET_POLICE_RESOURCE_MANAGER_URL";
/// Per-request timeout in whole seconds.
pub const TIMEOUT_SECS_ENV: &str = "BUDGET_POLICE_TIMEOUT_SECS";
/// Static access token; when unset the metadata server is used.
pub const ACCESS_TOKEN_ENV: &str = "BUDGET_POLICE_ACCESS_TOKEN";
/// Overrides the metadata server base URL.
pub const METADATA_URL_ENV: &str = "BUDGET_POLICE_METADATA_URL";

/// Loads the configuration from the process environment.
///
/// # Errors
///
/// Returns [`ConfigError`] when a variable is set to an invalid value.
pub fn from_env() -> ConfigResult<EnforcerConfig> {
    from_lookup(|key| env::var(key).ok())
}

/// Loads the configuration using `lookup` to resolve variables.
///
/// Empty values are treated as unset.
///
/// # Errors
///
/// Returns [`ConfigError`] when a variable is set to an invalid value.
pub fn from_lookup<F>(lookup: F) -> ConfigResult<EnforcerConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
    let mut config = EnforcerConfig::production()?;

    if let Some(url) = get(BUDGETS_URL_ENV) {
        config = config.with_budgets_url(&url)?;
    }
    if let Some(url) = get(BILLING_URL_ENV) {
        config = config.with_billing_url(&url)?;
    }
    if let Some(url) = get(RESOURCE_MANAGER_URL_ENV) {
        config = config.with_resource_manager_url(&url)?;
    }
    if let Some(raw) = get(TIMEOUT_SECS_ENV) {
        config = config.with_timeout(parse_timeout(&raw)?);
    }

    let credentials = match (get(ACCESS_TOKEN_ENV), get(METADATA_URL_ENV)) {
        (Some(token), _) => Credentials::AccessToken(token.trim().to_owned()),
        (None, Some(url)) => Credentials::MetadataServer { url },
        (None, None) => Credentials::default(),
    };
    debug!(?credentials, "resolved credential source");

    Ok(config.with_credentials(credentials))
}

fn parse_timeout(raw: &str) -> ConfigResult<Duration> {
    let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key: TIMEOUT_SECS_ENV,
        reason: format!("`{raw}` is not a whole number of seconds"),
    })?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            key: TIMEOUT_SECS_ENV,
            reason: "timeout must be greater than zero".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> ConfigResult<EnforcerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_production_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(
            config.billing().base_url(),
            "https://cloudbilling.googleapis.com/"
        );
        assert_eq!(config.credentials(), &Credentials::default());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            (BILLING_URL_ENV, "http://localhost:9000"),
            (TIMEOUT_SECS_ENV, "5"),
            (ACCESS_TOKEN_ENV, " token "),
        ])
        .unwrap();

        assert_eq!(config.billing().base_url(), "http://localhost:9000/");
        assert_eq!(config.budgets().timeout(), Duration::from_secs(5));
        assert_eq!(
            config.credentials(),
            &Credentials::AccessToken("token".into())
        );
    }

    #[test]
    fn metadata_url_override_is_used_without_token() {
        let config = load(&[(METADATA_URL_ENV, "http://127.0.0.1:8081/")]).unwrap();
        assert_eq!(
            config.credentials(),
            &Credentials::MetadataServer {
                url: "http://127.0.0.1:8081/".into()
            }
        );
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = load(&[(BUDGETS_URL_ENV, "  "), (TIMEOUT_SECS_ENV, "")]).unwrap();
        assert_eq!(
            config.budgets().base_url(),
            "https://billingbudgets.googleapis.com/"
        );
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        for raw in ["abc", "0", "-1"] {
            let err = load(&[(TIMEOUT_SECS_ENV, raw)]).expect_err("invalid timeout");
            assert!(matches!(err, ConfigError::Invalid { key: TIMEOUT_SECS_ENV, .. }));
        }
    }

    #[test]
    fn invalid_url_is_rejected() {
        let err = load(&[(RESOURCE_MANAGER_URL_ENV, "ftp://example.com")]).expect_err("bad url");
        assert!(matches!(err, ConfigError::Adapter(_)));
    }
}
