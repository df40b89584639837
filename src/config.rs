//! Client configuration.

use crate::error::{ApiError, ApiResult};
use crate::logging::log_debug;
use reqwest::header::HeaderName;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default deadline applied to every request unless a call overrides it.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the hospital-management backend, without a trailing slash.
    pub base_url: String,

    /// Transport-level deadline per request attempt. Timeout enforcement is
    /// owned by the transport; the pipeline only classifies the result.
    pub request_timeout: Duration,

    /// Name of the header carrying the tenant (hospital) identifier.
    pub tenant_header: String,

    /// Path of the token refresh endpoint, relative to `base_url`.
    pub refresh_path: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            tenant_header: "x-hospital-id".to_string(),
            refresh_path: "/api/v1/auth/refresh".to_string(),
        }
    }
}

impl ClientConfig {
    /// Configuration pointing at `base_url` with defaults for everything else.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Validate the configuration is complete.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if:
    /// - The base URL is empty or not an http(s) URL
    /// - The request timeout is zero
    /// - The tenant header is not a valid header name
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::configuration_error("Base URL is required"));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::configuration_error(format!(
                "Base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ApiError::configuration_error(
                "Request timeout must be non-zero",
            ));
        }
        if HeaderName::from_bytes(self.tenant_header.as_bytes()).is_err() {
            return Err(ApiError::configuration_error(format!(
                "Invalid tenant header name: {}",
                self.tenant_header
            )));
        }
        Ok(())
    }

    /// Absolute URL of the token refresh endpoint: `base_url` joined with
    /// `refresh_path`.
    pub fn refresh_url(&self) -> String {
        format!("{}{}", self.base_url, self.refresh_path)
    }

    /// Parsed tenant header name. Call [`validate`](Self::validate) first;
    /// falls back to the default header when the configured name is invalid.
    pub(crate) fn tenant_header_name(&self) -> HeaderName {
        HeaderName::from_bytes(self.tenant_header.as_bytes())
            .unwrap_or(crate::interceptor::TENANT_HEADER)
    }

    /// Build configuration from environment variables.
    ///
    /// Reads `HOSPITAL_API_BASE_URL` (required), `HOSPITAL_API_TIMEOUT_SECS`
    /// and `HOSPITAL_API_REFRESH_PATH` (optional).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Configuration`] if the base URL is missing or any
    /// value fails validation.
    pub fn from_env() -> ApiResult<Self> {
        let base_url = std::env::var("HOSPITAL_API_BASE_URL").map_err(|_| {
            ApiError::configuration_error("HOSPITAL_API_BASE_URL environment variable is required")
        })?;

        let mut config = Self::new(base_url);

        if let Ok(secs) = std::env::var("HOSPITAL_API_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                ApiError::configuration_error(format!(
                    "HOSPITAL_API_TIMEOUT_SECS must be an integer, got: {secs}"
                ))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        if let Ok(path) = std::env::var("HOSPITAL_API_REFRESH_PATH") {
            config.refresh_path = path;
        }

        config.validate()?;

        log_debug!(
            base_url = %config.base_url,
            timeout_secs = config.request_timeout.as_secs(),
            "Client configuration loaded from environment"
        );

        Ok(config)
    }
}
