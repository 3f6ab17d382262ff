//! Request descriptor
//!
//! Everything needed to (re)issue a call: method, path, query, headers and
//! body. A descriptor is built per call and replayed for every attempt.

use crate::types::{JsonValue, Method, StringMap};
use crate::upload::StageUpload;
use std::time::Duration;

/// Request body variants
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body
    #[default]
    Empty,
    /// JSON document
    Json(JsonValue),
    /// Multipart recording upload
    Upload(StageUpload),
}

/// A single API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL, or an absolute URL
    pub path: String,
    /// Query parameters, in order
    pub query: Vec<(String, String)>,
    /// Extra request headers
    pub headers: StringMap,
    /// Request body
    pub body: RequestBody,
    /// Override the per-attempt timeout
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    /// Create a request with no body
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: StringMap::new(),
            body: RequestBody::Empty,
            timeout: None,
        }
    }

    /// GET request
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// POST request
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// PUT request
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    /// DELETE request
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Add several query parameters
    #[must_use]
    pub fn queries<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set JSON body
    #[must_use]
    pub fn json(mut self, body: JsonValue) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Set multipart upload body
    #[must_use]
    pub fn upload(mut self, upload: StageUpload) -> Self {
        self.body = RequestBody::Upload(upload);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[cfg(test)]
mod request_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_request_builder() {
        let request = ApiRequest::get("/applications")
            .query("page", "1")
            .queries([("status", "waiting"), ("company", "Acme")])
            .header("X-Request-Id", "abc123")
            .json(serde_json::json!({"key": "value"}))
            .timeout(Duration::from_secs(10));

        assert_eq!(request.method, Method::GET);
        assert_eq!(request.path, "/applications");
        assert_eq!(
            request.query,
            vec![
                ("page".to_string(), "1".to_string()),
                ("status".to_string(), "waiting".to_string()),
                ("company".to_string(), "Acme".to_string()),
            ]
        );
        assert_eq!(
            request.headers.get("X-Request-Id"),
            Some(&"abc123".to_string())
        );
        assert!(matches!(request.body, RequestBody::Json(_)));
        assert_eq!(request.timeout, Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_request_defaults() {
        let request = ApiRequest::delete("/applications/3");
        assert_eq!(request.method, Method::DELETE);
        assert!(request.query.is_empty());
        assert!(matches!(request.body, RequestBody::Empty));
        assert!(request.timeout.is_none());
    }
}
