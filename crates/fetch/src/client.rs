//! Tenant-scoped HTTP client with coordinated token renewal.
//!
//! Every request carries the JSON content type, the tenant header and the
//! bearer token when one is held. A 401/403 answer starts (or joins) the
//! single renewal flight; once it succeeds the original request is retried
//! exactly once. A failed renewal clears the whole session and every waiter
//! receives [`Error::SessionInvalid`].

use std::sync::Arc;

use async_trait::async_trait;
use gridwire_core::TenantId;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::FetchConfig;
use crate::coordinator::Coordinator;
use crate::error::{Error, Result};
use crate::session::{Identity, SessionContext};
use crate::transport::{ApiRequest, Body, Transport};

const RENEWAL_KEY: &str = "access-token";

/// Successful renewal payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenewalResponse {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default)]
    user: Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Credentials {
    /// Bearer header when a token is held.
    Bearer,
    /// Cookie store only; used by the renewal call.
    CookiesOnly,
}

#[derive(Debug)]
struct Inner {
    config: FetchConfig,
    http: reqwest::Client,
    session: Arc<SessionContext>,
    renewals: Coordinator<&'static str, String, String>,
}

/// Resilient fetch client. Cheap to clone; clones share the session and
/// the renewal coordinator.
#[derive(Debug, Clone)]
pub struct FetchClient {
    inner: Arc<Inner>,
}

impl FetchClient {
    /// Create a client bound to `session`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the HTTP client cannot be built.
    pub fn new(config: FetchConfig, session: Arc<SessionContext>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| Error::config_error(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                http,
                session,
                renewals: Coordinator::new(),
            }),
        })
    }

    /// The session this client reads and renews.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext> {
        &self.inner.session
    }

    #[must_use]
    pub fn config(&self) -> &FetchConfig {
        &self.inner.config
    }

    /// Send a request, renewing the token once on 401/403.
    ///
    /// # Errors
    ///
    /// - [`Error::SessionInvalid`] if renewal failed (the session is cleared).
    /// - [`Error::ServerRejected`] for non-2xx answers, including a second
    ///   authorization failure after renewal.
    /// - [`Error::Network`] / [`Error::Timeout`] for transport failures.
    pub async fn request(&self, request: ApiRequest, tenant: &TenantId) -> Result<Body> {
        let response = self.send(&request, tenant, Credentials::Bearer).await?;
        if !is_authorization_failure(response.status()) {
            return read_body(response).await;
        }

        warn!(
            status = response.status().as_u16(),
            url = %request.target,
            "Authorization failed, renewing token"
        );
        self.renew(tenant).await?;

        debug!(url = %request.target, "Retrying request with renewed token");
        let retry = self.send(&request, tenant, Credentials::Bearer).await?;
        read_body(retry).await
    }

    /// Send a request without ever attempting renewal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ServerRejected`] for any non-2xx answer and transport
    /// errors as is.
    pub async fn request_no_renewal(&self, request: ApiRequest, tenant: &TenantId) -> Result<Body> {
        let response = self.send(&request, tenant, Credentials::Bearer).await?;
        read_body(response).await
    }

    /// GET `target` and deserialize the body.
    ///
    /// # Errors
    ///
    /// Same as [`FetchClient::request`], plus [`Error::Json`] when the body
    /// does not match `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, target: &str, tenant: &TenantId) -> Result<T> {
        let body = self.request(ApiRequest::get(target), tenant).await?;
        Ok(serde_json::from_value(body)?)
    }

    /// Join or start the renewal flight.
    async fn renew(&self, tenant: &TenantId) -> Result<String> {
        let client = self.clone();
        let tenant = tenant.clone();
        self.inner
            .renewals
            .run_exclusive(RENEWAL_KEY, move || async move {
                client.perform_renewal(&tenant).await
            })
            .await
            .map_err(Error::session_invalid)
    }

    async fn perform_renewal(&self, tenant: &TenantId) -> std::result::Result<String, String> {
        info!("Renewing access token");
        let request = ApiRequest::get(self.inner.config.renewal_path.clone());

        let outcome = match self.send(&request, tenant, Credentials::CookiesOnly).await {
            Ok(response) => read_body(response).await,
            Err(e) => Err(e),
        }
        .and_then(|body| serde_json::from_value::<RenewalResponse>(body).map_err(Error::from));

        match outcome {
            Ok(renewed) => {
                self.inner
                    .session
                    .refresh(renewed.access_token.clone(), renewed.user);
                Ok(renewed.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token renewal failed, clearing session");
                self.inner.session.clear();
                Err(failure_message(e))
            }
        }
    }

    async fn send(
        &self,
        request: &ApiRequest,
        tenant: &TenantId,
        credentials: Credentials,
    ) -> Result<reqwest::Response> {
        let url = self.inner.config.resolve(&request.target)?;
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .header(self.inner.config.tenant_header.as_str(), tenant.as_str());

        if credentials == Credentials::Bearer {
            if let Some(token) = self.inner.session.token() {
                builder = builder.bearer_auth(token);
            }
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, url = %request.target, "Sending request");
        Ok(builder.send().await?)
    }
}

#[async_trait]
impl Transport for FetchClient {
    async fn send(&self, request: ApiRequest, tenant: &TenantId) -> Result<Body> {
        self.request(request, tenant).await
    }
}

const fn is_authorization_failure(status: StatusCode) -> bool {
    matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
}

/// Decode a response, turning non-2xx statuses into [`Error::ServerRejected`].
async fn read_body(response: reqwest::Response) -> Result<Body> {
    let status = response.status();
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(rejection(status, &bytes));
    }
    if bytes.is_empty() {
        return Ok(Body::Null);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Server message when the body is structured, else a status-derived one.
fn rejection(status: StatusCode, bytes: &[u8]) -> Error {
    let message = serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|body| {
            body.get("message")
                .or_else(|| body.get("error"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    Error::server_rejected(status.as_u16(), message)
}

fn failure_message(error: Error) -> String {
    match error {
        Error::ServerRejected { message, .. } => message,
        other => other.to_string(),
    }
}
