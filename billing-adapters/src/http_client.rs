use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use hyper::body::{Bytes, to_bytes};
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request, Uri};
use hyper_rustls::HttpsConnector;
use rustls::{ClientConfig, OwnedTrustAnchor, RootCertStore};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::time::timeout;
use tracing::debug;
use webpki_roots::TLS_SERVER_ROOTS;

use crate::auth::TokenSource;
use crate::traits::{AdapterError, AdapterResult};

pub(crate) type HyperClient = Client<HttpsConnector<HttpConnector>, Body>;

/// Default timeout applied to each REST call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[allow(clippy::unnecessary_wraps)]
pub(crate) fn build_https_client() -> AdapterResult<HyperClient> {
    let mut roots = RootCertStore::empty();
    roots.add_trust_anchors(TLS_SERVER_ROOTS.iter().map(|anchor| {
        OwnedTrustAnchor::from_subject_spki_name_constraints(
            anchor.subject,
            anchor.spki,
            anchor.name_constraints,
        )
    }));

    let config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();

    let mut http = HttpConnector::new();
    http.enforce_http(false);

    // Plain http stays allowed for the metadata server and local emulators.
    let connector = HttpsConnector::from((http, Arc::new(config)));

    Ok(Client::builder().build::<_, Body>(connector))
}

/// Endpoint configuration shared by the REST adapters.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: String,
    timeout: Duration,
}

impl ApiConfig {
    /// Creates a configuration targeting `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the URL is invalid.
    pub fn new(base_url: impl AsRef<str>) -> AdapterResult<Self> {
        Ok(Self {
            base_url: sanitize_base_url(base_url.as_ref())?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())?;
        Ok(self)
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the normalised base URL (always ends with `/`).
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Authenticated JSON client used by every Google REST adapter.
pub(crate) struct ApiClient {
    service: &'static str,
    client: HyperClient,
    config: ApiConfig,
    tokens: Arc<dyn TokenSource>,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("service", &self.service)
            .field("base_url", &self.config.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub(crate) fn new(
        service: &'static str,
        config: ApiConfig,
        tokens: Arc<dyn TokenSource>,
    ) -> AdapterResult<Self> {
        Ok(Self {
            service,
            client: build_https_client()?,
            config,
            tokens,
        })
    }

    /// Joins `path` (no leading slash) onto the base URL.
    pub(crate) fn uri(&self, path: &str) -> AdapterResult<Uri> {
        format!("{}{path}", self.config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                AdapterError::configuration(format!("invalid {} endpoint: {err}", self.service))
            })
    }

    pub(crate) async fn get_json<T>(&self, uri: Uri) -> AdapterResult<T>
    where
        T: DeserializeOwned,
    {
        let bytes = self.send(Method::GET, uri, Body::empty()).await?;
        self.decode(&bytes)
    }

    pub(crate) async fn put_json<B, T>(&self, uri: Uri, body: &B) -> AdapterResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let payload = serde_json::to_vec(body).map_err(|err| {
            AdapterError::transport(format!("failed to encode {} request: {err}", self.service))
        })?;
        let bytes = self.send(Method::PUT, uri, Body::from(payload)).await?;
        self.decode(&bytes)
    }

    async fn send(&self, method: Method, uri: Uri, body: Body) -> AdapterResult<Bytes> {
        let token = self.tokens.access_token().await?;
        debug!(service = self.service, %method, %uri, "sending request");

        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .map_err(|err| {
                AdapterError::transport(format!("failed to build {} request: {err}", self.service))
            })?;

        let response = timeout(self.config.timeout, self.client.request(req))
            .await
            .map_err(|_| AdapterError::transport(format!("{} request timed out", self.service)))?
            .map_err(|err| {
                AdapterError::transport(format!("{} request failed: {err}", self.service))
            })?;

        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.map_err(|err| {
            AdapterError::transport(format!("failed to read {} response: {err}", self.service))
        })?;

        if !status.is_success() {
            return Err(AdapterError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).trim().to_owned(),
            });
        }

        Ok(bytes)
    }

    fn decode<T>(&self, bytes: &[u8]) -> AdapterResult<T>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(bytes).map_err(|err| {
            AdapterError::response(format!("failed to decode {} response: {err}", self.service))
        })
    }
}

pub(crate) fn sanitize_base_url(input: &str) -> AdapterResult<String> {
    let mut base = input.trim().to_owned();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        return Err(AdapterError::configuration(
            "base URL must start with http:// or https://",
        ));
    }
    if !base.ends_with('/') {
        base.push('/');
    }
    base.parse::<Uri>()
        .map_err(|err| AdapterError::configuration(format!("invalid base URL: {err}")))?;
    Ok(base)
}
