// Shared helpers for the unit test suite.

use crate::credentials::SessionCredentials;

/// A full credential triple, matching an active doctor session.
pub fn full_credentials() -> SessionCredentials {
    SessionCredentials {
        access_token: Some("test-token".to_string()),
        refresh_token: Some("test-refresh".to_string()),
        tenant_id: Some("hospital-42".to_string()),
    }
}

/// No session at all (e.g. the login page itself).
pub fn empty_credentials() -> SessionCredentials {
    SessionCredentials::default()
}
