/// In-memory transport for tests.
///
/// Responses are registered per URL; every request is recorded so tests can
/// assert which endpoints were (or were not) contacted.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{HttpError, Transport};

/// A request observed by [`RecordingTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Transport that answers from a routing table and records every call.
///
/// Unrouted URLs fail with [`HttpError::Network`], which makes it a
/// convenient way to simulate an unreachable host.
#[derive(Default)]
pub struct RecordingTransport {
    text_routes: HashMap<String, Result<String, HttpError>>,
    json_routes: HashMap<String, Result<Value, HttpError>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl RecordingTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for GET requests to `url`.
    #[must_use]
    pub fn with_text(mut self, url: &str, body: &str) -> Self {
        self.text_routes
            .insert(url.to_string(), Ok(body.to_string()));
        self
    }

    /// Answer GET requests to `url` with the given HTTP status.
    #[must_use]
    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.text_routes.insert(
            url.to_string(),
            Err(HttpError::Status {
                url: url.to_string(),
                status,
                detail: String::new(),
            }),
        );
        self
    }

    /// Serve `value` for POST requests to `url`.
    #[must_use]
    pub fn with_json(mut self, url: &str, value: Value) -> Self {
        self.json_routes.insert(url.to_string(), Ok(value));
        self
    }

    /// Fail POST requests to `url` with `err`.
    #[must_use]
    pub fn with_json_error(mut self, url: &str, err: HttpError) -> Self {
        self.json_routes.insert(url.to_string(), Err(err));
        self
    }

    /// All requests seen so far, in order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// URLs of all requests seen so far, in order.
    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }

    fn record(&self, request: RecordedRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
    }

    fn unrouted(url: &str) -> HttpError {
        HttpError::Network {
            url: url.to_string(),
            message: "connection refused".to_string(),
        }
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn get_text(&self, url: &str) -> Result<String, HttpError> {
        self.record(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            headers: Vec::new(),
            body: None,
        });
        self.text_routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(Self::unrouted(url)))
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, HttpError> {
        self.record(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            headers: headers
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            body: Some(body.clone()),
        });
        self.json_routes
            .get(url)
            .cloned()
            .unwrap_or_else(|| Err(Self::unrouted(url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_routes_and_records() {
        let transport = RecordingTransport::new()
            .with_text("https://a.test/x", "hello")
            .with_status("https://a.test/missing", 404);

        assert_eq!(transport.get_text("https://a.test/x").await.unwrap(), "hello");
        let err = transport.get_text("https://a.test/missing").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(transport.get_text("https://nowhere.test").await.is_err());

        assert_eq!(
            transport.urls(),
            vec![
                "https://a.test/x",
                "https://a.test/missing",
                "https://nowhere.test"
            ]
        );
    }

    #[tokio::test]
    async fn test_post_records_headers_and_body() {
        let transport =
            RecordingTransport::new().with_json("https://api.test/search", json!({"ok": true}));

        let resp = transport
            .post_json(
                "https://api.test/search",
                &[("Authorization", "Bearer k")],
                &json!({"query": "q"}),
            )
            .await
            .unwrap();
        assert_eq!(resp["ok"], true);

        let recorded = &transport.requests()[0];
        assert_eq!(recorded.method, "POST");
        assert_eq!(
            recorded.headers,
            vec![("Authorization".to_string(), "Bearer k".to_string())]
        );
        assert_eq!(recorded.body.as_ref().unwrap()["query"], "q");
    }
}
