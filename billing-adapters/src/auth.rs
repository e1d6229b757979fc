//! Access token sources for the Google REST APIs.

use std::fmt;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use hyper::body::to_bytes;
use hyper::{Body, Request, Uri};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::debug;

use crate::http_client::{DEFAULT_TIMEOUT, HyperClient, build_https_client, sanitize_base_url};
use crate::traits::{AdapterError, AdapterResult};

/// Default metadata server base URL on Google Cloud runtimes.
pub const DEFAULT_METADATA_URL: &str = "http://metadata.google.internal/";

const TOKEN_PATH: &str = "computeMetadata/v1/instance/service-accounts/default/token";
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Supplies OAuth2 bearer tokens for outbound calls.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Returns a token valid for at least the next request.
    async fn access_token(&self) -> AdapterResult<String>;
}

/// Token source returning a fixed, externally managed token.
#[derive(Clone)]
pub struct StaticTokenSource {
    token: String,
}

impl StaticTokenSource {
    /// Wraps the supplied token.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the token is blank.
    pub fn new(token: impl Into<String>) -> AdapterResult<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AdapterError::configuration("access token cannot be empty"));
        }
        Ok(Self { token })
    }
}

impl fmt::Debug for StaticTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticTokenSource").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenSource for StaticTokenSource {
    async fn access_token(&self) -> AdapterResult<String> {
        Ok(self.token.clone())
    }
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// Token source backed by the instance metadata server of the attached
/// service account.
pub struct MetadataTokenSource {
    client: HyperClient,
    endpoint: Uri,
    timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for MetadataTokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetadataTokenSource")
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl MetadataTokenSource {
    /// Creates a token source talking to the metadata server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> AdapterResult<Self> {
        let base = sanitize_base_url(base_url.as_ref())?;
        let endpoint = format!("{base}{TOKEN_PATH}")
            .parse::<Uri>()
            .map_err(|err| AdapterError::configuration(format!("invalid metadata URL: {err}")))?;

        Ok(Self {
            client: build_https_client()?,
            endpoint,
            timeout: DEFAULT_TIMEOUT,
            cached: Mutex::new(None),
        })
    }

    /// Sets the timeout applied to each token request.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the timeout applied to each token request.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch(&self) -> AdapterResult<MetadataToken> {
        let req = Request::get(self.endpoint.clone())
            .header("Metadata-Flavor", "Google")
            .body(Body::empty())
            .map_err(|err| {
                AdapterError::authentication(format!("failed to build token request: {err}"))
            })?;

        let response = timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| AdapterError::authentication("metadata token request timed out"))?
            .map_err(|err| {
                AdapterError::authentication(format!("metadata token request failed: {err}"))
            })?;

        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            AdapterError::authentication(format!("failed to read metadata token: {err}"))
        })?;

        if !status.is_success() {
            return Err(AdapterError::authentication(format!(
                "metadata server returned {status}: {}",
                String::from_utf8_lossy(&bytes).trim()
            )));
        }

        serde_json::from_slice(&bytes).map_err(|err| {
            AdapterError::authentication(format!("failed to decode metadata token: {err}"))
        })
    }
}

#[async_trait]
impl TokenSource for MetadataTokenSource {
    async fn access_token(&self) -> AdapterResult<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached
            .as_ref()
            .filter(|token| Instant::now() < token.refresh_at)
        {
            return Ok(token.value.clone());
        }

        let fresh = self.fetch().await?;
        debug!(expires_in = fresh.expires_in, "refreshed metadata access token");
        let value = fresh.access_token;
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_at: refresh_deadline(Instant::now(), fresh.expires_in),
        });
        Ok(value)
    }
}

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

fn refresh_deadline(now: Instant, expires_in: u64) -> Instant {
    let lifetime = Duration::from_secs(expires_in).saturating_sub(EXPIRY_MARGIN);
    now + lifetime
}
