//! Session credential storage and token refresh.
//!
//! Credentials live behind a single-owner [`CredentialStore`] abstraction
//! instead of ambient global state. The client reads and updates it through a
//! defined interface: the pre-send decoration stages read it, the recovery
//! step asks it to refresh or invalidate. The interceptor pipeline never owns
//! the store.

use crate::envelope::ApiEnvelope;
use crate::error::{ApiError, ApiResult};
use crate::logging::{log_debug, log_info, log_warn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

/// The credential triple attached to outgoing requests.
///
/// All fields optional; absence of a field simply omits the corresponding
/// request header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    /// Bearer token for the `Authorization` header.
    pub access_token: Option<String>,
    /// Long-lived token exchanged for a fresh access token on 401 recovery.
    pub refresh_token: Option<String>,
    /// Hospital id for the `X-Hospital-Id` header, scoping server-side data
    /// access to one tenant.
    pub tenant_id: Option<String>,
}

/// Read/update/invalidate interface over the shared credential state.
///
/// Implementations must make `refresh_session` atomic with respect to
/// concurrent readers: a reader observes either the old token pair or the new
/// one, never a mix.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Current access token, if a session is active.
    async fn access_token(&self) -> Option<String>;

    /// Current refresh token, if a session is active.
    async fn refresh_token(&self) -> Option<String>;

    /// Tenant (hospital) identifier for the active session.
    async fn tenant_id(&self) -> Option<String>;

    /// Exchange the stored refresh token for a fresh token pair and store it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when no refresh token is stored or
    /// the server rejects the exchange; transport failures propagate with
    /// their own classification.
    async fn refresh_session(&self) -> ApiResult<()>;

    /// Clear stored tokens after an unrecoverable auth failure.
    async fn invalidate_session(&self);
}

/// Fresh token pair returned by a successful refresh exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Performs the actual refresh-token exchange against the auth backend.
///
/// Split out of the store so tests can drive refresh outcomes without a
/// server, and so the store stays transport-agnostic.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Exchange `refresh_token` for a new token pair.
    async fn exchange(&self, refresh_token: &str) -> ApiResult<TokenPair>;
}

/// Process-local credential store backed by a `tokio` RwLock.
///
/// The write lock is held across the whole token-pair update so concurrent
/// readers never see a half-applied refresh.
pub struct InMemoryCredentialStore {
    state: RwLock<SessionCredentials>,
    refresher: Box<dyn TokenRefresher>,
}

impl InMemoryCredentialStore {
    /// Create a store seeded with `credentials` and the given refresher.
    pub fn new(credentials: SessionCredentials, refresher: Box<dyn TokenRefresher>) -> Self {
        Self {
            state: RwLock::new(credentials),
            refresher,
        }
    }

    /// Replace the stored credentials wholesale (e.g. after login).
    pub async fn set_credentials(&self, credentials: SessionCredentials) {
        let mut state = self.state.write().await;
        *state = credentials;
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn access_token(&self) -> Option<String> {
        self.state.read().await.access_token.clone()
    }

    async fn refresh_token(&self) -> Option<String> {
        self.state.read().await.refresh_token.clone()
    }

    async fn tenant_id(&self) -> Option<String> {
        self.state.read().await.tenant_id.clone()
    }

    async fn refresh_session(&self) -> ApiResult<()> {
        let refresh_token = self
            .refresh_token()
            .await
            .ok_or_else(|| ApiError::unauthorized("No refresh token available"))?;

        let pair = self.refresher.exchange(&refresh_token).await?;

        let mut state = self.state.write().await;
        state.access_token = Some(pair.access_token);
        state.refresh_token = Some(pair.refresh_token);

        log_info!("Session refreshed");
        Ok(())
    }

    async fn invalidate_session(&self) {
        let mut state = self.state.write().await;
        // Tenant id scopes data, it does not authenticate; it survives
        // invalidation so a re-login lands in the same hospital context.
        state.access_token = None;
        state.refresh_token = None;
        log_warn!("Session invalidated after unrecoverable auth failure");
    }
}

/// [`TokenRefresher`] that posts the refresh token to the auth endpoint.
pub struct HttpTokenRefresher {
    http: reqwest::Client,
    refresh_url: String,
    timeout_seconds: u64,
}

impl HttpTokenRefresher {
    /// `refresh_url` is the absolute URL of the refresh endpoint, typically
    /// `<base_url>/api/v1/auth/refresh`. `timeout_seconds` is the deadline
    /// already configured on `http`, reported back on timeout errors.
    pub fn new(http: reqwest::Client, refresh_url: impl Into<String>, timeout_seconds: u64) -> Self {
        Self {
            http,
            refresh_url: refresh_url.into(),
            timeout_seconds,
        }
    }

    /// Build a refresher for `config`'s refresh endpoint
    /// (`base_url` + `refresh_path`), with its own transport honoring the
    /// configured request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the configuration fails
    /// validation or the HTTP transport cannot be constructed.
    pub fn from_config(config: &crate::config::ClientConfig) -> ApiResult<Self> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| {
                ApiError::configuration_error(format!("Failed to build HTTP transport: {e}"))
            })?;
        Ok(Self::new(
            http,
            config.refresh_url(),
            config.request_timeout.as_secs(),
        ))
    }
}

#[async_trait]
impl TokenRefresher for HttpTokenRefresher {
    async fn exchange(&self, refresh_token: &str) -> ApiResult<TokenPair> {
        log_debug!(url = %self.refresh_url, "Exchanging refresh token");

        let response = self
            .http
            .post(&self.refresh_url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::timeout(self.timeout_seconds)
                } else {
                    ApiError::network_failure(Some(Box::new(e)))
                }
            })?;

        let status = response.status();
        let envelope: ApiEnvelope<TokenPair> = response
            .json()
            .await
            .map_err(|e| ApiError::decode_error(format!("Invalid refresh response: {e}")))?;

        if !status.is_success() || !envelope.success {
            let message = envelope
                .message
                .unwrap_or_else(|| "Token refresh rejected".to_string());
            return Err(ApiError::unauthorized(message));
        }

        envelope
            .into_data()
            .ok_or_else(|| ApiError::decode_error("Refresh response missing token pair"))
    }
}
