//! Web search augmentation through the Tavily search API.
use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::WebSearchConfig;
use crate::http::{HttpError, Transport};

#[derive(Error, Debug)]
pub enum WebSearchError {
    #[error("search API rejected the API key")]
    Unauthorized,

    #[error("search API quota exceeded")]
    RateLimited,

    #[error(transparent)]
    Http(HttpError),

    #[error("unexpected search response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<HttpError> for WebSearchError {
    fn from(err: HttpError) -> Self {
        match err.status() {
            Some(401) | Some(403) => WebSearchError::Unauthorized,
            Some(429) | Some(432) => WebSearchError::RateLimited,
            _ => WebSearchError::Http(err),
        }
    }
}

/// One web search hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

pub struct WebSearcher {
    transport: Arc<dyn Transport>,
    api_key: String,
    config: WebSearchConfig,
}

impl WebSearcher {
    pub fn new(
        transport: Arc<dyn Transport>,
        api_key: impl Into<String>,
        config: WebSearchConfig,
    ) -> Self {
        Self {
            transport,
            api_key: api_key.into(),
            config,
        }
    }

    /// Search the web; failures are logged and yield no results.
    pub async fn search(&self, query: &str) -> Vec<WebResult> {
        info!("Searching the web for additional context...");
        match self.try_search(query).await {
            Ok(results) if results.is_empty() => {
                info!("No web results found (continuing with docs only)");
                results
            }
            Ok(results) => {
                info!("Found {} web results", results.len());
                for (i, r) in results.iter().enumerate() {
                    info!("  [{}] {}", i + 1, r.url);
                }
                results
            }
            Err(e) => {
                warn!("Web search failed: {e}");
                warn!("Continuing with local documentation only");
                Vec::new()
            }
        }
    }

    pub async fn try_search(&self, query: &str) -> Result<Vec<WebResult>, WebSearchError> {
        let body = json!({
            "query": query,
            "max_results": self.config.max_results,
            "search_depth": "basic",
            "include_answer": false,
            "include_raw_content": false,
            "days": self.config.recency_days,
            "exclude_domains": self.config.exclude_domains,
        });
        let auth = format!("Bearer {}", self.api_key);

        let resp = self
            .transport
            .post_json(&self.config.endpoint, &[("Authorization", auth.as_str())], &body)
            .await?;
        let parsed: TavilyResponse = serde_json::from_value(resp)?;

        Ok(parsed
            .results
            .into_iter()
            .filter(|r| !r.url.is_empty())
            .take(self.config.max_results)
            .map(|r| WebResult {
                title: r.title,
                url: r.url,
                snippet: r.content,
            })
            .collect())
    }
}
