// Unit Tests for the Interceptor Pipeline
//
// UNIT UNDER TEST: InterceptorPipeline stages and classification functions
//
// BUSINESS RESPONSIBILITY:
//   - Decorate outgoing requests with Authorization and tenant headers
//   - Stay total: absent/invalid credentials omit headers, never fail
//   - Classify failed responses into the four-way taxonomy
//   - Prefer the envelope's message field over generic fallbacks
//
// TEST COVERAGE:
//   - Bearer header format and omission
//   - Tenant header exact value and omission
//   - Stage ordering and caller-header survival
//   - Status classification (401, 5xx, success:false bodies)
//   - Message extraction precedence and fallbacks

use crate::error::Classification;
use crate::interceptor::{
    classify_status, AuthHeaderStage, InterceptorPipeline, RequestStage, TenantHeaderStage,
    TENANT_HEADER,
};
use crate::request::RequestDescriptor;
use crate::tests::helpers::{empty_credentials, full_credentials};
use reqwest::header::AUTHORIZATION;
use reqwest::{Method, StatusCode};

fn descriptor() -> RequestDescriptor {
    RequestDescriptor::new(Method::GET, "/test", None)
}

#[cfg(test)]
mod decoration_tests {
    use super::*;

    #[test]
    fn test_auth_header_uses_bearer_scheme() {
        // The outgoing Authorization header must equal "Bearer " + token

        let mut request = descriptor();
        AuthHeaderStage.apply(&mut request, &full_credentials());

        let value = request
            .headers
            .get(AUTHORIZATION)
            .expect("Authorization header should be set")
            .to_str()
            .unwrap();
        assert_eq!(value, "Bearer test-token");
    }

    #[test]
    fn test_auth_header_omitted_without_token() {
        // No access token means no Authorization header, not an error

        let mut request = descriptor();
        AuthHeaderStage.apply(&mut request, &empty_credentials());

        assert!(
            request.headers.get(AUTHORIZATION).is_none(),
            "Authorization header should be absent without a token"
        );
    }

    #[test]
    fn test_auth_header_total_on_invalid_token() {
        // A token with header-invalid characters is skipped, never a panic

        let mut credentials = full_credentials();
        credentials.access_token = Some("bad\ntoken".to_string());

        let mut request = descriptor();
        AuthHeaderStage.apply(&mut request, &credentials);

        assert!(request.headers.get(AUTHORIZATION).is_none());
    }

    #[test]
    fn test_tenant_header_exact_value() {
        // X-Hospital-Id carries the tenant id exactly

        let mut request = descriptor();
        TenantHeaderStage::default().apply(&mut request, &full_credentials());

        let value = request
            .headers
            .get(&TENANT_HEADER)
            .expect("Tenant header should be set")
            .to_str()
            .unwrap();
        assert_eq!(value, "hospital-42");
    }

    #[test]
    fn test_tenant_header_omitted_without_id() {
        let mut request = descriptor();
        TenantHeaderStage::default().apply(&mut request, &empty_credentials());

        assert!(request.headers.get(&TENANT_HEADER).is_none());
    }

    #[test]
    fn test_standard_pipeline_sets_both_headers() {
        // The standard pipeline runs auth then tenant decoration

        let pipeline = InterceptorPipeline::standard(TENANT_HEADER);
        let mut request = descriptor();
        pipeline.decorate(&mut request, &full_credentials());

        assert!(request.headers.contains_key(AUTHORIZATION));
        assert!(request.headers.contains_key(&TENANT_HEADER));
    }

    #[test]
    fn test_pipeline_total_with_no_credentials() {
        // Decoration never fails; absent credentials leave headers empty

        let pipeline = InterceptorPipeline::standard(TENANT_HEADER);
        let mut request = descriptor();
        pipeline.decorate(&mut request, &empty_credentials());

        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_decoration_mutates_only_headers() {
        // Stages must not touch method, path, body, or the retry flag

        let pipeline = InterceptorPipeline::standard(TENANT_HEADER);
        let mut request = RequestDescriptor::new(
            Method::POST,
            "/api/v1/patients",
            Some(serde_json::json!({ "name": "Ada" })),
        );
        pipeline.decorate(&mut request, &full_credentials());

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.path, "/api/v1/patients");
        assert_eq!(request.body, Some(serde_json::json!({ "name": "Ada" })));
        assert!(!request.retried());
    }
}

#[cfg(test)]
mod classification_tests {
    use super::*;

    #[test]
    fn test_401_classified_unauthorized_with_message() {
        // Structured message field takes priority over the fallback

        let body = serde_json::to_vec(&serde_json::json!({
            "success": false,
            "message": "Invalid credentials"
        }))
        .unwrap();

        let err = classify_status(StatusCode::UNAUTHORIZED, &body);

        assert_eq!(err.classification(), Classification::Unauthorized);
        assert_eq!(err.display_message(), "Invalid credentials");
    }

    #[test]
    fn test_401_without_body_uses_fallback_message() {
        let err = classify_status(StatusCode::UNAUTHORIZED, b"");

        assert_eq!(err.classification(), Classification::Unauthorized);
        assert_eq!(err.display_message(), "Unauthorized");
    }

    #[test]
    fn test_500_classified_other_with_message() {
        let body = serde_json::to_vec(&serde_json::json!({
            "success": false,
            "message": "Database unavailable"
        }))
        .unwrap();

        let err = classify_status(StatusCode::INTERNAL_SERVER_ERROR, &body);

        assert_eq!(err.classification(), Classification::Other);
        assert_eq!(err.display_message(), "Database unavailable");
    }

    #[test]
    fn test_unparseable_error_body_uses_unknown_error() {
        // A non-envelope body still classifies, with the generic fallback

        let err = classify_status(StatusCode::BAD_GATEWAY, b"<html>oops</html>");

        assert_eq!(err.classification(), Classification::Other);
        assert_eq!(err.display_message(), "Unknown error");
    }

    #[test]
    fn test_field_errors_carried_through() {
        let body = serde_json::to_vec(&serde_json::json!({
            "success": false,
            "message": "Validation failed",
            "errors": ["name is required", "dob must be a date"]
        }))
        .unwrap();

        let err = classify_status(StatusCode::UNPROCESSABLE_ENTITY, &body);

        match err {
            crate::error::ApiError::Api { errors, .. } => {
                assert_eq!(errors.len(), 2, "Both field errors should survive");
            }
            other => panic!("Expected Api error, got: {:?}", other),
        }
    }
}
