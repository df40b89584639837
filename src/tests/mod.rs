// Unit test modules for hospital-api-client
//
// Integration tests that need a live HTTP endpoint (wiremock) live in the
// top-level tests/ directory; everything here runs without a server.

pub mod helpers;

pub mod interceptor;
