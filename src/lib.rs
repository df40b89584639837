//! # hospital-api-client
//!
//! Async API client for multi-tenant hospital-management backends.
//!
//! ## Key Features
//!
//! - **Interceptor pipeline**: auth and tenant headers decorated centrally,
//!   so callers never repeat credential logic
//! - **Refresh-and-retry**: a 401 triggers at most one token refresh and
//!   re-issue of the original request, with coalescing of concurrent refreshes
//! - **Classified failures**: Unauthorized, Network, Timeout, and server
//!   errors are distinct values carrying display-ready messages
//! - **Injected credential store**: session state has a single owner shared
//!   via [`CredentialStore`], not ambient globals
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use hospital_api_client::{
//!     ApiClient, ClientConfig, HttpTokenRefresher, InMemoryCredentialStore,
//!     RequestOptions, SessionCredentials,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ClientConfig::new("https://api.hospital.example");
//! let refresher = HttpTokenRefresher::from_config(&config)?;
//! let store = Arc::new(InMemoryCredentialStore::new(
//!     SessionCredentials {
//!         access_token: Some("token".to_string()),
//!         refresh_token: Some("refresh".to_string()),
//!         tenant_id: Some("hospital-1".to_string()),
//!     },
//!     Box::new(refresher),
//! ));
//!
//! let client = ApiClient::new(config, store)?;
//! let patients: hospital_api_client::ApiEnvelope =
//!     client.get("/api/v1/patients", RequestOptions::new()).await?;
//! # Ok(())
//! # }
//! ```

// Allow missing errors documentation - errors are self-documenting via type signatures
#![allow(clippy::missing_errors_doc)]

// Logging utilities (re-exports tracing with log_* naming) - internal only
pub(crate) mod logging;

pub mod client;
pub mod config;
pub mod credentials;
pub mod envelope;
pub mod error;
pub mod interceptor;
pub mod request;

#[cfg(test)]
pub mod tests;

// Re-export main types
pub use client::ApiClient;
pub use config::ClientConfig;
pub use credentials::{
    CredentialStore, HttpTokenRefresher, InMemoryCredentialStore, SessionCredentials, TokenPair,
    TokenRefresher,
};
pub use envelope::ApiEnvelope;
pub use error::{ApiError, ApiResult, Classification};
pub use interceptor::{
    AuthHeaderStage, InterceptorPipeline, RequestStage, TenantHeaderStage, TENANT_HEADER,
};
pub use request::{RequestDescriptor, RequestOptions};
