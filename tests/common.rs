//! Shared helpers for the integration test suite.
//!
//! Each integration test binary compiles this file independently and uses a
//! different subset of it.
#![allow(dead_code)]

use async_trait::async_trait;
use hospital_api_client::{
    ApiClient, ApiError, ApiResult, ClientConfig, HttpTokenRefresher, InMemoryCredentialStore,
    SessionCredentials, TokenPair, TokenRefresher,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::{Match, MockServer, Request};

/// Credentials for an active session against `hospital-42`.
pub fn full_credentials() -> SessionCredentials {
    SessionCredentials {
        access_token: Some("test-token".to_string()),
        refresh_token: Some("test-refresh".to_string()),
        tenant_id: Some("hospital-42".to_string()),
    }
}

/// Client wired to `server`, refreshing through the server's
/// `/api/v1/auth/refresh` endpoint. Returns the store too so tests can
/// inspect session state afterwards.
pub fn client_against(
    server: &MockServer,
    credentials: SessionCredentials,
) -> (ApiClient, Arc<InMemoryCredentialStore>) {
    client_with_config(ClientConfig::new(server.uri()), credentials)
}

/// Client over an explicit configuration, refreshing through the configured
/// `refresh_path`.
pub fn client_with_config(
    config: ClientConfig,
    credentials: SessionCredentials,
) -> (ApiClient, Arc<InMemoryCredentialStore>) {
    let refresher =
        HttpTokenRefresher::from_config(&config).expect("Refresher construction should succeed");
    let store = Arc::new(InMemoryCredentialStore::new(
        credentials,
        Box::new(refresher),
    ));
    let client =
        ApiClient::new(config, store.clone()).expect("Client construction should succeed");
    (client, store)
}

/// Matcher asserting a header is absent from the request.
pub struct HeaderAbsent(pub &'static str);

impl Match for HeaderAbsent {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key(self.0)
    }
}

/// [`TokenRefresher`] that counts exchanges through a shared counter and
/// sleeps long enough for concurrent 401s to pile up behind the refresh gate.
pub struct CountingRefresher {
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

impl CountingRefresher {
    /// Returns the refresher and a counter handle that survives boxing.
    pub fn new(delay: Duration) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
                delay,
            },
            calls,
        )
    }
}

#[async_trait]
impl TokenRefresher for CountingRefresher {
    async fn exchange(&self, _refresh_token: &str) -> ApiResult<TokenPair> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(TokenPair {
            access_token: "fresh-access".to_string(),
            refresh_token: "fresh-refresh".to_string(),
        })
    }
}

/// [`TokenRefresher`] that always fails, counting attempts.
pub struct AlwaysFailingRefresher {
    calls: Arc<AtomicUsize>,
}

impl AlwaysFailingRefresher {
    pub fn new() -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                calls: calls.clone(),
            },
            calls,
        )
    }
}

#[async_trait]
impl TokenRefresher for AlwaysFailingRefresher {
    async fn exchange(&self, _refresh_token: &str) -> ApiResult<TokenPair> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ApiError::unauthorized("Refresh token expired"))
    }
}

/// Build a client around a custom refresher implementation.
pub fn client_with_refresher(
    server: &MockServer,
    credentials: SessionCredentials,
    refresher: Box<dyn TokenRefresher>,
) -> (ApiClient, Arc<InMemoryCredentialStore>) {
    let store = Arc::new(InMemoryCredentialStore::new(credentials, refresher));
    let client = ApiClient::new(ClientConfig::new(server.uri()), store.clone())
        .expect("Client construction should succeed");
    (client, store)
}
