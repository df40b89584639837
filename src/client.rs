//! The API client and its send loop.

use crate::config::ClientConfig;
use crate::credentials::{CredentialStore, SessionCredentials};
use crate::envelope::ApiEnvelope;
use crate::error::{ApiError, ApiResult, Classification};
use crate::interceptor::{classify_status, classify_transport, InterceptorPipeline};
use crate::logging::{log_debug, log_info, log_warn};
use crate::request::{RequestDescriptor, RequestOptions};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Async client for the hospital-management API.
///
/// Every call runs through the interceptor pipeline: pre-send stages decorate
/// the request from the shared credential store, and a failed response is
/// classified into Unauthorized / Network / Timeout / Other. An Unauthorized
/// failure triggers at most one token-refresh-and-retry cycle per request;
/// everything else is surfaced to the caller unmodified.
///
/// The client never owns the credential store; it reads and updates it
/// through [`CredentialStore`], so several clients (or non-HTTP code) can
/// share one session.
pub struct ApiClient {
    http: reqwest::Client,
    config: ClientConfig,
    credentials: Arc<dyn CredentialStore>,
    pipeline: InterceptorPipeline,
    /// Serializes refresh attempts so concurrent 401s coalesce into one
    /// refresh instead of racing token writes.
    refresh_gate: Mutex<()>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client over `config`, sharing `credentials`.
    ///
    /// The underlying transport is built once with
    /// `Content-Type: application/json` as a default header (individual calls
    /// may override it via [`RequestOptions`]) and the configured request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the configuration fails
    /// validation or the HTTP transport cannot be constructed.
    pub fn new(config: ClientConfig, credentials: Arc<dyn CredentialStore>) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(default_headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ApiError::configuration_error(format!("Failed to build HTTP transport: {e}"))
            })?;

        let pipeline = InterceptorPipeline::standard(config.tenant_header_name());

        log_debug!(
            base_url = %config.base_url,
            timeout_secs = config.request_timeout.as_secs(),
            "ApiClient created"
        );

        Ok(Self {
            http,
            config,
            credentials,
            pipeline,
            refresh_gate: Mutex::new(()),
        })
    }

    /// Create a client using environment variables for configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if required environment variables
    /// are missing or invalid. See [`ClientConfig::from_env`].
    pub fn from_env(credentials: Arc<dyn CredentialStore>) -> ApiResult<Self> {
        Self::new(ClientConfig::from_env()?, credentials)
    }

    /// The shared credential store this client reads and updates.
    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Issue a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<ApiEnvelope<T>> {
        self.send(RequestDescriptor::new(Method::GET, path, None), options)
            .await
    }

    /// Issue a POST request with a JSON body.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<ApiEnvelope<T>> {
        let body = encode_body(body)?;
        self.send(RequestDescriptor::new(Method::POST, path, Some(body)), options)
            .await
    }

    /// Issue a PUT request with a JSON body.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: RequestOptions,
    ) -> ApiResult<ApiEnvelope<T>> {
        let body = encode_body(body)?;
        self.send(RequestDescriptor::new(Method::PUT, path, Some(body)), options)
            .await
    }

    /// Issue a DELETE request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> ApiResult<ApiEnvelope<T>> {
        self.send(RequestDescriptor::new(Method::DELETE, path, None), options)
            .await
    }

    /// Core send loop: decorate, dispatch, classify, recover.
    ///
    /// The loop body runs at most twice. A second pass happens only when the
    /// first failed Unauthorized with the retry flag unset and the refresh
    /// succeeded; the retried descriptor carries the same method, path, and
    /// body, with headers rebuilt from the refreshed credentials.
    async fn send<T: DeserializeOwned>(
        &self,
        mut request: RequestDescriptor,
        options: RequestOptions,
    ) -> ApiResult<ApiEnvelope<T>> {
        loop {
            let snapshot = self.credential_snapshot().await;
            request.headers.clear();
            self.pipeline.decorate(&mut request, &snapshot);
            // Caller-supplied headers win over decorated ones.
            for (name, value) in options.headers.iter() {
                request.headers.insert(name.clone(), value.clone());
            }

            log_debug!(
                method = %request.method,
                path = %request.path,
                correlation_id = %request.correlation_id,
                retried = request.retried(),
                "Dispatching request"
            );

            match self.dispatch::<T>(&request, options.timeout).await {
                Ok(envelope) => return Ok(envelope),
                Err(err)
                    if err.classification() == Classification::Unauthorized
                        && !request.retried() =>
                {
                    request.mark_retried();

                    if self
                        .refresh_credentials(snapshot.access_token.as_deref())
                        .await
                        .is_ok()
                    {
                        log_info!(
                            correlation_id = %request.correlation_id,
                            "Session refreshed, retrying request once"
                        );
                        continue;
                    }

                    log_warn!(
                        correlation_id = %request.correlation_id,
                        "Token refresh failed, surfacing original error"
                    );
                    self.credentials.invalidate_session().await;
                    return Err(err);
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Read the credentials the decoration stages need. The refresh token is
    /// deliberately not snapshotted; only the store touches it.
    async fn credential_snapshot(&self) -> SessionCredentials {
        SessionCredentials {
            access_token: self.credentials.access_token().await,
            refresh_token: None,
            tenant_id: self.credentials.tenant_id().await,
        }
    }

    /// Refresh the session through the coalescing gate.
    ///
    /// `seen_token` is the access token the failing request was sent with. If
    /// the store already holds a different token by the time the gate is
    /// acquired, a concurrent request refreshed first and this attempt is
    /// skipped.
    async fn refresh_credentials(&self, seen_token: Option<&str>) -> ApiResult<()> {
        let _guard = self.refresh_gate.lock().await;

        let current = self.credentials.access_token().await;
        if current.as_deref() != seen_token {
            log_debug!("Token already refreshed by a concurrent request");
            return Ok(());
        }

        self.credentials.refresh_session().await
    }

    /// One transport round trip plus post-receive classification.
    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: &RequestDescriptor,
        timeout: Option<Duration>,
    ) -> ApiResult<ApiEnvelope<T>> {
        let url = format!("{}{}", self.config.base_url, request.path);
        let timeout_seconds = timeout.unwrap_or(self.config.request_timeout).as_secs();

        let mut builder = self
            .http
            .request(request.method.clone(), &url)
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| classify_transport(e, timeout_seconds))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_transport(e, timeout_seconds))?;

        if !status.is_success() {
            return Err(classify_status(status, &bytes));
        }

        let envelope: ApiEnvelope<T> = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::decode_error(format!("Invalid response envelope: {e}")))?;

        if !envelope.success {
            // 2xx status but the server flagged failure; classify from the
            // body so the envelope's message takes precedence.
            return Err(classify_status(status, &bytes));
        }

        Ok(envelope)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> ApiResult<serde_json::Value> {
    serde_json::to_value(body)
        .map_err(|e| ApiError::decode_error(format!("Failed to encode request body: {e}")))
}
