//! Wire-format response envelope shared by every backend endpoint.
//!
//! All hospital-management API responses use the same JSON shape:
//! `{ success: boolean, data?: T, message?: string, errors?: string[] }`.
//! The envelope is what the interceptor pipeline's classification step reads
//! the `message` field from, and what callers receive on success.

use serde::{Deserialize, Serialize};

/// Deserialized response envelope.
///
/// `T` is the endpoint-specific payload type; defaults to raw JSON for
/// callers that do not want a typed payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T = serde_json::Value> {
    /// Whether the server considers the operation successful. A 2xx status
    /// with `success: false` is still classified as a failure. Lenient on
    /// decode: a body missing the flag reads as a failure.
    #[serde(default)]
    pub success: bool,

    /// Endpoint-specific payload, present on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Human-readable message. On failures this takes precedence over any
    /// generic fallback.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Structured per-field validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiEnvelope<T> {
    /// Consume the envelope and return the payload.
    ///
    /// Returns `None` when the envelope carried no `data` field.
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// The envelope's message field, when present.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}
