//! Per-call request descriptor and caller-supplied options.

use reqwest::header::HeaderMap;
use reqwest::Method;
use std::time::Duration;
use uuid::Uuid;

/// Mutable description of one outgoing request.
///
/// Constructed per call and owned exclusively by the call that issues it.
/// The pre-send interceptor stages mutate only the header map; the recovery
/// step flips the retry flag before a refreshed re-issue. The flag is
/// monotone: once set it is never cleared for the descriptor's lifetime,
/// which is what bounds 401 recovery to a single retry.
#[derive(Debug)]
pub struct RequestDescriptor {
    /// HTTP method, preserved exactly across a retry.
    pub method: Method,
    /// Path relative to the client's base URL, preserved exactly across a retry.
    pub path: String,
    /// JSON body, preserved exactly across a retry.
    pub body: Option<serde_json::Value>,
    /// Outgoing headers; keys unique. Rebuilt by the decoration stages on
    /// every (re-)issue so a retry picks up refreshed credentials.
    pub headers: HeaderMap,
    /// Correlation id carried through log events for this request's lifetime.
    pub correlation_id: Uuid,
    retried: bool,
}

impl RequestDescriptor {
    /// Create a descriptor for one logical request. The retry flag starts unset.
    pub fn new(method: Method, path: impl Into<String>, body: Option<serde_json::Value>) -> Self {
        Self {
            method,
            path: path.into(),
            body,
            headers: HeaderMap::new(),
            correlation_id: Uuid::new_v4(),
            retried: false,
        }
    }

    /// Whether this descriptor has already been re-issued after a 401.
    pub fn retried(&self) -> bool {
        self.retried
    }

    /// Mark the descriptor as consumed its single retry. Irreversible.
    pub fn mark_retried(&mut self) {
        self.retried = true;
    }
}

/// Per-call overrides supplied by the caller.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    /// Extra headers merged in after the decoration stages run. A caller
    /// header wins over a decorated one with the same key.
    pub headers: HeaderMap,
    /// Overrides the client-wide request timeout for this call only.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style timeout override.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}
