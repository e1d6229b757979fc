//! Strongly typed configuration for the enforcer.

use std::fmt;
use std::time::Duration;

use billing_adapters::{ApiConfig, DEFAULT_TIMEOUT};
use billing_adapters::auth::DEFAULT_METADATA_URL;
use billing_adapters::budgets::DEFAULT_BUDGETS_URL;
use billing_adapters::cloudbilling::DEFAULT_BILLING_URL;
use billing_adapters::resource_manager::DEFAULT_RESOURCE_MANAGER_URL;

use crate::ConfigResult;

/// How outbound calls are authenticated.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// A pre-issued OAuth2 access token.
    AccessToken(String),
    /// Tokens minted by the metadata server at the given base URL.
    MetadataServer {
        /// Base URL of the metadata server.
        url: String,
    },
}

impl Default for Credentials {
    fn default() -> Self {
        Self::MetadataServer {
            url: DEFAULT_METADATA_URL.to_owned(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
            Self::MetadataServer { url } => f
                .debug_struct("MetadataServer")
                .field("url", url)
                .finish(),
        }
    }
}

/// Endpoints, timeouts, and credentials for the three remote services.
#[derive(Clone, Debug)]
pub struct EnforcerConfig {
    budgets: ApiConfig,
    billing: ApiConfig,
    resource_manager: ApiConfig,
    metadata_timeout: Duration,
    credentials: Credentials,
}

impl EnforcerConfig {
    /// Returns the production configuration with metadata-server credentials.
    ///
    /// # Errors
    ///
    /// Only fails if a built-in endpoint constant is malformed.
    pub fn production() -> ConfigResult<Self> {
        Ok(Self {
            budgets: ApiConfig::new(DEFAULT_BUDGETS_URL)?,
            billing: ApiConfig::new(DEFAULT_BILLING_URL)?,
            resource_manager: ApiConfig::new(DEFAULT_RESOURCE_MANAGER_URL)?,
            metadata_timeout: DEFAULT_TIMEOUT,
            credentials: Credentials::default(),
        })
    }

    /// Overrides the Budgets API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Adapter`](crate::ConfigError::Adapter) if the URL is invalid.
    pub fn with_budgets_url(mut self, url: &str) -> ConfigResult<Self> {
        self.budgets = self.budgets.with_base_url(url)?;
        Ok(self)
    }

    /// Overrides the Cloud Billing API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Adapter`](crate::ConfigError::Adapter) if the URL is invalid.
    pub fn with_billing_url(mut self, url: &str) -> ConfigResult<Self> {
        self.billing = self.billing.with_base_url(url)?;
        Ok(self)
    }

    /// Overrides the Resource Manager API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Adapter`](crate::ConfigError::Adapter) if the URL is invalid.
    pub fn with_resource_manager_url(mut self, url: &str) -> ConfigResult<Self> {
        self.resource_manager = self.resource_manager.with_base_url(url)?;
        Ok(self)
    }

    /// Applies one request timeout to every service and to the metadata server.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.budgets = self.budgets.with_timeout(timeout);
        self.billing = self.billing.with_timeout(timeout);
        self.resource_manager = self.resource_manager.with_timeout(timeout);
        self.metadata_timeout = timeout;
        self
    }

    /// Sets the credential source.
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Returns the Budgets API configuration.
    #[must_use]
    pub fn budgets(&self) -> &ApiConfig {
        &self.budgets
    }

    /// Returns the Cloud Billing API configuration.
    #[must_use]
    pub fn billing(&self) -> &ApiConfig {
        &self.billing
    }

    /// Returns the Resource Manager API configuration.
    #[must_use]
    pub fn resource_manager(&self) -> &ApiConfig {
        &self.resource_manager
    }

    /// Returns the timeout for metadata server token requests.
    #[must_use]
    pub const fn metadata_timeout(&self) -> Duration {
        self.metadata_timeout
    }

    /// Returns the credential source.
    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }
}
