//! Test response wrapper.

use crate::error::TestError;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use std::fmt;
use trips_core::ErrorEnvelope;

/// A buffered response with helpers for assertions.
#[derive(Debug, Clone)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl TestResponse {
    /// Buffers an HTTP response.
    pub async fn from_http<B>(response: http::Response<B>) -> Result<Self, TestError>
    where
        B: http_body_util::BodyExt,
        B::Error: fmt::Display,
    {
        let (parts, body) = response.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| TestError::BodyRead(e.to_string()))?
            .to_bytes();

        Ok(Self {
            status: parts.status,
            headers: parts.headers,
            body,
        })
    }

    /// Creates a response from raw parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the status code as a u16.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    /// Returns true for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets a header value by name.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&HeaderValue> {
        self.headers.get(name.as_ref())
    }

    /// Gets a header value as a string.
    #[must_use]
    pub fn header_str(&self, name: impl AsRef<str>) -> Option<&str> {
        self.header(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header_str(header::CONTENT_TYPE.as_str())
    }

    /// Returns the raw body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as a string.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("invalid UTF-8: {e}")))
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        serde_json::from_slice(&self.body).map_err(TestError::Json)
    }

    /// Deserializes the body as a JSON value.
    pub fn json_value(&self) -> Result<serde_json::Value, TestError> {
        self.json()
    }

    /// Deserializes the body as the standard error envelope.
    pub fn error_envelope(&self) -> Result<ErrorEnvelope, TestError> {
        self.json()
    }

    /// The `error.code` of an error response, if the body is an envelope.
    #[must_use]
    pub fn error_code(&self) -> Option<String> {
        self.error_envelope()
            .ok()
            .map(|envelope| envelope.error.code)
    }

    // Assertion methods

    /// Asserts the status code.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {}, got {} with body {}",
            expected,
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts the status code as a u16.
    ///
    /// # Panics
    ///
    /// Panics if the status code doesn't match.
    pub fn assert_status_code(&self, expected: u16) -> &Self {
        assert_eq!(
            self.status.as_u16(),
            expected,
            "expected status {}, got {} with body {}",
            expected,
            self.status.as_u16(),
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Asserts that a header exists with the expected value.
    ///
    /// # Panics
    ///
    /// Panics if the header doesn't exist or doesn't match.
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        let actual = self
            .header_str(name)
            .unwrap_or_else(|| panic!("header '{}' not found", name));
        assert_eq!(
            actual, expected,
            "header '{}': expected '{}', got '{}'",
            name, expected, actual
        );
        self
    }

    /// Asserts that the Content-Type starts with `expected`.
    ///
    /// # Panics
    ///
    /// Panics if Content-Type is missing or doesn't match.
    pub fn assert_content_type(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let actual = self.content_type().unwrap_or_else(|| panic!("Content-Type header not found"));
        assert!(
            actual.starts_with(expected),
            "Content-Type: expected '{}', got '{}'",
            expected,
            actual
        );
        self
    }

    /// Asserts the status and the `error.code` of an error envelope.
    ///
    /// # Panics
    ///
    /// Panics if either doesn't match or the body is not an envelope.
    pub fn assert_error(&self, status: StatusCode, code: &str) -> &Self {
        self.assert_status(status);
        let envelope = self
            .error_envelope()
            .unwrap_or_else(|e| panic!("expected an error envelope: {e}"));
        assert_eq!(envelope.error.code, code, "unexpected error code");
        self
    }

    /// Asserts that the body contains `expected`.
    ///
    /// # Panics
    ///
    /// Panics if the body doesn't contain the substring.
    pub fn assert_body_contains(&self, expected: impl AsRef<str>) -> &Self {
        let expected = expected.as_ref();
        let body = String::from_utf8_lossy(&self.body);
        assert!(
            body.contains(expected),
            "body should contain '{}', got: {}",
            expected,
            body
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    fn envelope_response() -> TestResponse {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        TestResponse::new(
            StatusCode::BAD_REQUEST,
            headers,
            Bytes::from_static(
                br#"{"error":{"code":"EMPTY_TRIP","message":"trip has no flights","category":"validation"}}"#,
            ),
        )
    }

    #[tokio::test]
    async fn test_from_http() {
        let response = http::Response::builder()
            .status(StatusCode::OK)
            .header("x-request-id", "abc")
            .body(Full::new(Bytes::from_static(b"{\"ok\":true}")))
            .unwrap();

        let response = TestResponse::from_http(response).await.unwrap();
        assert_eq!(response.status_code(), 200);
        assert!(response.is_success());
        assert_eq!(response.header_str("x-request-id"), Some("abc"));
        assert_eq!(response.json_value().unwrap()["ok"], true);
    }

    #[test]
    fn test_error_helpers() {
        let response = envelope_response();
        assert_eq!(response.error_code().as_deref(), Some("EMPTY_TRIP"));
        response
            .assert_error(StatusCode::BAD_REQUEST, "EMPTY_TRIP")
            .assert_content_type("application/json")
            .assert_body_contains("no flights");
    }

    #[test]
    fn test_error_code_on_plain_body() {
        let response = TestResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(b"[]"));
        assert_eq!(response.error_code(), None);
        assert_eq!(response.text().unwrap(), "[]");
    }

    #[test]
    #[should_panic(expected = "expected status")]
    fn test_assert_status_panics() {
        envelope_response().assert_status(StatusCode::OK);
    }
}
