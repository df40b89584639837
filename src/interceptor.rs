//! Request/response interceptor stages.
//!
//! The pipeline has two halves:
//!
//! - Pre-send: an ordered list of [`RequestStage`]s, each total (never
//!   fails), that decorate the outgoing [`RequestDescriptor`]'s headers from
//!   a snapshot of the session credentials. Absent credentials simply omit
//!   the corresponding header.
//! - Post-receive: classification of the HTTP response or transport error
//!   into the four-way [`Classification`](crate::error::Classification)
//!   taxonomy. Recovery (the single refresh-and-retry) lives in the client's
//!   send loop, not here; these functions only decide what a failure *is*.

use crate::credentials::SessionCredentials;
use crate::envelope::ApiEnvelope;
use crate::error::ApiError;
use crate::logging::log_trace;
use crate::request::RequestDescriptor;
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::StatusCode;

/// Header carrying the tenant (hospital) identifier.
pub const TENANT_HEADER: HeaderName = HeaderName::from_static("x-hospital-id");

/// One pre-send decoration stage.
///
/// Stages mutate only the descriptor's header map and must be total: a stage
/// that cannot apply (missing credential, unencodable value) leaves the
/// descriptor untouched rather than failing the request.
pub trait RequestStage: Send + Sync {
    /// Stage name for trace logging.
    fn name(&self) -> &'static str;

    /// Apply this stage to the outgoing request.
    fn apply(&self, request: &mut RequestDescriptor, credentials: &SessionCredentials);
}

/// Sets `Authorization: Bearer <token>` when an access token is present.
pub struct AuthHeaderStage;

impl RequestStage for AuthHeaderStage {
    fn name(&self) -> &'static str {
        "auth_header"
    }

    fn apply(&self, request: &mut RequestDescriptor, credentials: &SessionCredentials) {
        let Some(token) = credentials.access_token.as_deref() else {
            return;
        };
        // Totality: a token with characters invalid in a header value just
        // omits the header, which the server rejects as unauthenticated.
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {token}")) {
            request.headers.insert(AUTHORIZATION, value);
        }
    }
}

/// Sets the tenant header when a tenant id is present.
pub struct TenantHeaderStage {
    header: HeaderName,
}

impl TenantHeaderStage {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }
}

impl Default for TenantHeaderStage {
    fn default() -> Self {
        Self::new(TENANT_HEADER)
    }
}

impl RequestStage for TenantHeaderStage {
    fn name(&self) -> &'static str {
        "tenant_header"
    }

    fn apply(&self, request: &mut RequestDescriptor, credentials: &SessionCredentials) {
        let Some(tenant_id) = credentials.tenant_id.as_deref() else {
            return;
        };
        if let Ok(value) = HeaderValue::from_str(tenant_id) {
            request.headers.insert(self.header.clone(), value);
        }
    }
}

/// Ordered list of pre-send stages.
pub struct InterceptorPipeline {
    stages: Vec<Box<dyn RequestStage>>,
}

impl InterceptorPipeline {
    /// The standard pipeline: auth header then tenant header.
    pub fn standard(tenant_header: HeaderName) -> Self {
        Self {
            stages: vec![
                Box::new(AuthHeaderStage),
                Box::new(TenantHeaderStage::new(tenant_header)),
            ],
        }
    }

    /// Build a pipeline from custom stages, run in the given order.
    pub fn with_stages(stages: Vec<Box<dyn RequestStage>>) -> Self {
        Self { stages }
    }

    /// Run every stage over the descriptor. Total; mutates only headers.
    pub fn decorate(&self, request: &mut RequestDescriptor, credentials: &SessionCredentials) {
        for stage in &self.stages {
            stage.apply(request, credentials);
            log_trace!(
                stage = stage.name(),
                correlation_id = %request.correlation_id,
                "Pre-send stage applied"
            );
        }
    }
}

/// Classify a received HTTP failure status, preferring the envelope's
/// `message` field over generic fallbacks.
///
/// Only call for statuses/envelopes that are known failures; the client
/// handles the success path directly.
pub fn classify_status(status: StatusCode, body: &[u8]) -> ApiError {
    let envelope: Option<ApiEnvelope> = serde_json::from_slice(body).ok();
    let message = envelope.as_ref().and_then(|e| e.message.clone());
    let errors = envelope
        .and_then(|e| e.errors)
        .unwrap_or_default();

    if status == StatusCode::UNAUTHORIZED {
        return ApiError::unauthorized(message.unwrap_or_else(|| "Unauthorized".to_string()));
    }

    ApiError::api_error(
        status.as_u16(),
        message.unwrap_or_else(|| "Unknown error".to_string()),
        errors,
    )
}

/// Classify a transport-level error: a reported deadline becomes Timeout,
/// anything where no response was received becomes Network.
pub fn classify_transport(error: reqwest::Error, timeout_seconds: u64) -> ApiError {
    if error.is_timeout() {
        ApiError::timeout(timeout_seconds)
    } else {
        ApiError::network_failure(Some(Box::new(error)))
    }
}
