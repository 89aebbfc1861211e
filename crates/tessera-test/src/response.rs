//! Response inspection.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use http_body_util::BodyExt;
use serde::de::DeserializeOwned;
use tessera_core::TesseraError;
use tessera_http::{Response, ResponseExt};

use crate::error::TestError;

/// A buffered response with assertion helpers.
#[derive(Debug)]
pub struct TestResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    error: Option<String>,
}

impl TestResponse {
    /// Buffers a dispatcher response.
    pub async fn from_response(response: Response) -> Result<Self, TestError> {
        let error = response.attached_error().map(TesseraError::detail);
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
            error,
        })
    }

    /// Returns the status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns all headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns one header as a string.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|value| value.to_str().ok())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the body as UTF-8 text.
    pub fn text(&self) -> Result<String, TestError> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| TestError::BodyRead(format!("Invalid UTF-8: {e}")))
    }

    /// Decodes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Returns the detail of the error the dispatcher converted, if any.
    #[must_use]
    pub fn error_detail(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Panics unless the status is `expected`.
    #[track_caller]
    pub fn assert_status(&self, expected: StatusCode) -> &Self {
        assert_eq!(
            self.status,
            expected,
            "expected status {expected}, got {}; body: {}",
            self.status,
            String::from_utf8_lossy(&self.body)
        );
        self
    }

    /// Panics unless header `name` equals `expected`.
    #[track_caller]
    pub fn assert_header(&self, name: impl AsRef<str>, expected: impl AsRef<str>) -> &Self {
        let name = name.as_ref();
        let expected = expected.as_ref();
        match self.header(name) {
            Some(actual) => assert_eq!(actual, expected, "header {name} mismatch"),
            None => panic!("header {name} missing, expected {expected}"),
        }
        self
    }

    /// Panics unless the body contains `needle`.
    #[track_caller]
    pub fn assert_body_contains(&self, needle: impl AsRef<str>) -> &Self {
        let body = String::from_utf8_lossy(&self.body);
        assert!(
            body.contains(needle.as_ref()),
            "body does not contain {:?}: {body}",
            needle.as_ref()
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tessera_http::response;

    #[tokio::test]
    async fn test_from_response() {
        let response = response::html("hello").attach_error(Arc::new(TesseraError::internal("boom")));
        let response = TestResponse::from_response(response).await.unwrap();

        response
            .assert_status(StatusCode::OK)
            .assert_header("content-type", "text/html; charset=utf-8")
            .assert_body_contains("ell");
        assert_eq!(response.text().unwrap(), "hello");
        assert!(response.error_detail().unwrap().contains("boom"));
    }

    #[tokio::test]
    async fn test_json() {
        let response = response::json(&serde_json::json!({"ok": true})).unwrap();
        let response = TestResponse::from_response(response).await.unwrap();
        let value: serde_json::Value = response.json().unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    #[should_panic(expected = "expected status 404")]
    async fn test_assert_status_panics() {
        let response = TestResponse::from_response(response::html("x")).await.unwrap();
        response.assert_status(StatusCode::NOT_FOUND);
    }
}
