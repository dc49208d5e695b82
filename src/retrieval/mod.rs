//! Document retrieval strategies.
//!
//! - [`map::MapRetriever`]: manifest → LLM selection → fetch
//! - [`mcp::McpRetriever`]: hosted documentation server over MCP
pub mod fetcher;
pub mod map;
pub mod mcp;
pub mod selector;

use async_trait::async_trait;
use thiserror::Error;

pub use mcp::McpClientError;

/// A retrieved document. MCP results carry no URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedDoc {
    pub content: String,
    pub url: Option<String>,
}

impl RetrievedDoc {
    pub fn new(content: impl Into<String>, url: Option<String>) -> Self {
        Self {
            content: content.into(),
            url,
        }
    }
}

#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("failed to retrieve from MCP server: {0}")]
    Mcp(#[from] McpClientError),
}

/// A strategy producing official documentation for a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDoc>, RetrievalError>;

    /// Short label used in logs.
    fn name(&self) -> &'static str;
}
