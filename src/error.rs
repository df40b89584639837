//! Error types for API client operations.
//!
//! This module provides structured error handling for hospital-api-client,
//! including the four-way failure classification used by the interceptor
//! pipeline, severity levels, and recovery guidance.
//!
//! # Error Types
//!
//! The main error type is [`ApiError`], which covers all failure modes:
//! - Authorization failures (HTTP 401, expired or missing tokens)
//! - Network failures (no response received from the server)
//! - Transport timeouts
//! - Server/validation errors carrying a display message and field errors
//! - Response decoding failures
//! - Client configuration errors
//!
//! # Classification
//!
//! Every error maps onto a [`Classification`], which is what the pipeline's
//! recovery step switches on:
//!
//! ```rust
//! use hospital_api_client::error::{ApiError, Classification};
//!
//! fn is_auth_failure(err: &ApiError) -> bool {
//!     err.classification() == Classification::Unauthorized
//! }
//! ```
//!
//! # Result Type
//!
//! Use [`ApiResult<T>`] as a convenient alias for `Result<T, ApiError>`:
//!
//! ```rust
//! use hospital_api_client::ApiResult;
//!
//! fn my_function() -> ApiResult<String> {
//!     Ok("Success".to_string())
//! }
//! ```

use crate::logging::{log_debug, log_error, log_warn};
use thiserror::Error;

// ============================================================================
// Error categorization types
// ============================================================================

/// Failure classification used by the interceptor pipeline's recovery step.
///
/// Derived per response/error via [`ApiError::classification()`]; never
/// persisted. Only `Unauthorized` is eligible for the refresh-and-retry
/// protocol, and only once per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// HTTP 401 - the current access token is missing, expired, or invalid.
    Unauthorized,

    /// No HTTP response was received at all (DNS, connect, broken pipe).
    Network,

    /// The transport-level deadline elapsed before a response arrived.
    Timeout,

    /// Any other failure: non-2xx statuses, `success:false` envelopes,
    /// undecodable bodies, configuration problems.
    Other,
}

/// Severity level for logging and alerting decisions.
///
/// Use [`ApiError::severity()`] to get the severity for any error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Action failed but system is stable.
    ///
    /// Should be logged and investigated but not urgent.
    Error,

    /// Unexpected but recoverable situation.
    ///
    /// Worth logging for monitoring but may not require action.
    Warning,

    /// Expected failure (e.g., validation error).
    ///
    /// Normal operation, log at info/debug level.
    Info,
}

// ============================================================================
// API Error types
// ============================================================================

/// Convenient result type for API client operations.
///
/// Alias for `Result<T, ApiError>`.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Errors that can occur when issuing API requests.
///
/// Each variant includes relevant context and can be:
/// - Classified via [`classification()`](Self::classification)
/// - Assessed for severity via [`severity()`](Self::severity)
/// - Checked for recoverability via [`is_recoverable()`](Self::is_recoverable)
/// - Converted to display-ready messages via [`display_message()`](Self::display_message)
///
/// # Creating Errors
///
/// Use the constructor methods which automatically log the error:
///
/// ```rust
/// use hospital_api_client::ApiError;
///
/// // These methods log automatically
/// let err = ApiError::unauthorized("Invalid credentials");
/// let err = ApiError::network_failure(None);
/// let err = ApiError::timeout(30);
/// ```
///
/// # Classifications
///
/// | Variant | Classification | Refresh-eligible |
/// |---------|----------------|------------------|
/// | `Unauthorized` | Unauthorized | Yes (once) |
/// | `Network` | Network | No |
/// | `Timeout` | Timeout | No |
/// | `Api` | Other | No |
/// | `Decode` | Other | No |
/// | `Configuration` | Other | No |
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server rejected the request with HTTP 401.
    ///
    /// Carries the server's message when the response envelope provided one.
    /// The pipeline recovers from this at most once per request via the
    /// token-refresh-and-retry protocol.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Server-provided message, or a generic fallback.
        message: String,
    },

    /// No response was received from the server.
    ///
    /// Distinguishes "no server reached" from "server rejected". The display
    /// message is always exactly `"Network Error"`.
    #[error("{message}")]
    Network {
        /// Always `"Network Error"`.
        message: String,
        /// The underlying transport error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The transport deadline elapsed before a response arrived.
    ///
    /// Timeout enforcement belongs to the transport; this variant only
    /// records the configured deadline for display. Never retried.
    #[error("Request timed out after {timeout_seconds}s")]
    Timeout {
        /// The timeout duration that was exceeded.
        timeout_seconds: u64,
    },

    /// The server returned a failure envelope or a non-2xx status.
    ///
    /// Covers validation errors, conflicts, and server faults. The message
    /// comes from the envelope's `message` field when present, else
    /// `"Unknown error"`.
    #[error("API error ({status}): {message}")]
    Api {
        /// The HTTP status code (200 when a 2xx response carried
        /// `success:false`).
        status: u16,
        /// Display-ready message for the caller.
        message: String,
        /// Structured per-field errors, when the server supplied them.
        errors: Vec<String>,
    },

    /// A body could not be serialized for sending or decoded as the
    /// expected envelope.
    #[error("Response decoding failed: {message}")]
    Decode {
        /// Details about the (de)serialization failure.
        message: String,
    },

    /// Client configuration is invalid or incomplete.
    ///
    /// Common causes:
    /// - Empty or malformed base URL
    /// - Zero request timeout
    /// - Header values containing invalid characters
    #[error("Client configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl ApiError {
    /// Get the failure classification the recovery step switches on.
    ///
    /// ```rust
    /// use hospital_api_client::error::{ApiError, Classification};
    ///
    /// let err = ApiError::unauthorized("token expired");
    /// assert_eq!(err.classification(), Classification::Unauthorized);
    /// ```
    pub fn classification(&self) -> Classification {
        match self {
            Self::Unauthorized { .. } => Classification::Unauthorized,
            Self::Network { .. } => Classification::Network,
            Self::Timeout { .. } => Classification::Timeout,
            Self::Api { .. } => Classification::Other,
            Self::Decode { .. } => Classification::Other,
            Self::Configuration { .. } => Classification::Other,
        }
    }

    /// Get the error severity for logging and alerting.
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Unauthorized { .. } => ErrorSeverity::Warning,
            Self::Network { .. } => ErrorSeverity::Error,
            Self::Timeout { .. } => ErrorSeverity::Warning,
            Self::Api { .. } => ErrorSeverity::Info,
            Self::Decode { .. } => ErrorSeverity::Warning,
            Self::Configuration { .. } => ErrorSeverity::Error,
        }
    }

    /// Whether the pipeline may attempt local recovery for this error.
    ///
    /// Returns `true` only for `Unauthorized`; the refresh-and-retry protocol
    /// is the single recovery path, and it is bounded to one attempt by the
    /// request descriptor's retry flag. Network and Timeout failures are
    /// surfaced immediately so the caller can distinguish them.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Convert to a display-ready message suitable for the caller to render.
    ///
    /// Structured messages from the server take priority; generic fallbacks
    /// are used otherwise. Rendering is the caller's responsibility.
    pub fn display_message(&self) -> String {
        match self {
            Self::Unauthorized { message } => message.clone(),
            Self::Network { message, .. } => message.clone(),
            Self::Timeout { timeout_seconds } => {
                format!("Request timed out after {timeout_seconds}s")
            }
            Self::Api { message, .. } => message.clone(),
            Self::Decode { .. } => "Unknown error".to_string(),
            Self::Configuration { message } => message.clone(),
        }
    }

    // =========================================================================
    // Constructor methods with automatic logging
    // =========================================================================
    //
    // These methods automatically log the error at the appropriate level.
    // Use them instead of constructing variants directly.

    /// Create an unauthorized error (logs at WARN level).
    pub fn unauthorized(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "unauthorized",
            message = %message,
            "Request rejected with HTTP 401"
        );
        Self::Unauthorized { message }
    }

    /// Create a network failure error (logs at ERROR level).
    ///
    /// The display message is fixed to `"Network Error"` so callers can match
    /// on it.
    pub fn network_failure(source: Option<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        log_error!(
            error_type = "network",
            has_source = source.is_some(),
            "No response received from server"
        );
        Self::Network {
            message: "Network Error".to_string(),
            source,
        }
    }

    pub fn timeout(timeout_seconds: u64) -> Self {
        log_warn!(
            error_type = "timeout",
            timeout_seconds = timeout_seconds,
            "Request deadline exceeded"
        );
        Self::Timeout { timeout_seconds }
    }

    pub fn api_error(status: u16, message: impl Into<String>, errors: Vec<String>) -> Self {
        let message = message.into();
        log_debug!(
            error_type = "api",
            status = status,
            message = %message,
            field_error_count = errors.len(),
            "Server returned failure envelope"
        );
        Self::Api {
            status,
            message,
            errors,
        }
    }

    pub fn decode_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_warn!(
            error_type = "decode",
            message = %message,
            "Response body format invalid"
        );
        Self::Decode { message }
    }

    pub fn configuration_error(message: impl Into<String>) -> Self {
        let message = message.into();
        log_error!(
            error_type = "configuration",
            message = %message,
            "Client configuration validation failed"
        );
        Self::Configuration { message }
    }
}
