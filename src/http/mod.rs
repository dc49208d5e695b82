/// HTTP transport used by every remote call except MCP.
///
/// The pipeline talks to four HTTP services (manifest host, documentation
/// pages, the LLM endpoint and the web search API). All of them go through
/// the [`Transport`] trait so that tests can observe or replace the network.
pub mod mock;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Errors produced by a [`Transport`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HttpError {
    #[error("request to {url} failed: {message}")]
    Network { url: String, message: String },

    /// `detail` carries the start of the error body, if any.
    #[error("{url} returned status {status}{}", detail_suffix(.detail))]
    Status {
        url: String,
        status: u16,
        detail: String,
    },

    #[error("failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Build(String),
}

/// Longest error body excerpt kept in [`HttpError::Status`].
const MAX_DETAIL_CHARS: usize = 300;

fn detail_suffix(detail: &str) -> String {
    if detail.is_empty() {
        String::new()
    } else {
        format!(": {detail}")
    }
}

/// Collapse whitespace and cut an error body down to [`MAX_DETAIL_CHARS`].
fn summarize_body(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= MAX_DETAIL_CHARS {
        return collapsed;
    }
    let mut cut: String = collapsed.chars().take(MAX_DETAIL_CHARS).collect();
    cut.push_str("...");
    cut
}

impl HttpError {
    /// HTTP status code, if the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Minimal async HTTP surface needed by the pipeline.
///
/// Implementations must be `Send + Sync` so they can be shared behind `Arc`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` and return the body as text. Non-2xx statuses are errors.
    async fn get_text(&self, url: &str) -> Result<String, HttpError>;

    /// POST a JSON body with extra headers and decode the JSON response.
    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, HttpError>;
}

/// [`Transport`] backed by `reqwest`.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Build a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("langgraph-helper/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { client })
    }
}

fn network_error(url: &str, err: reqwest::Error) -> HttpError {
    HttpError::Network {
        url: url.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get_text(&self, url: &str) -> Result<String, HttpError> {
        debug!("GET {url}");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| network_error(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                detail: String::new(),
            });
        }

        resp.text().await.map_err(|e| HttpError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, HttpError> {
        debug!("POST {url}");
        let mut req = self.client.post(url).json(body);
        for &(name, value) in headers {
            req = req.header(name, value);
        }

        let resp = req.send().await.map_err(|e| network_error(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!("{url} error body: {body}");
            return Err(HttpError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                detail: summarize_body(&body),
            });
        }

        resp.json::<Value>().await.map_err(|e| HttpError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}
