//! Retrieval through a hosted documentation server speaking MCP.
//!
//! The server is reached over the streamable HTTP transport via the `rmcp`
//! client. Its search tool already returns relevant content, so the query is
//! forwarded as-is.
use async_trait::async_trait;
use rmcp::ServiceExt;
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{RetrievalError, RetrievedDoc, Retriever};

#[derive(Error, Debug)]
pub enum McpClientError {
    #[error("failed to connect to {url}: {message}")]
    Connect { url: String, message: String },

    #[error("failed to list tools: {0}")]
    ListTools(String),

    #[error("no tools available from MCP server")]
    NoTools,

    #[error("tool {tool} failed: {message}")]
    Call { tool: String, message: String },

    #[error("MCP server returned no results")]
    EmptyResult,
}

/// Name and description of a tool advertised by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
}

pub struct McpRetriever {
    server_url: String,
}

impl McpRetriever {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
        }
    }

    async fn retrieve_docs(&self, query: &str) -> Result<Vec<RetrievedDoc>, McpClientError> {
        info!("Retrieving documentation from MCP server...");

        let transport = StreamableHttpClientTransport::from_uri(self.server_url.as_str());
        let service = ().serve(transport).await.map_err(|e| McpClientError::Connect {
            url: self.server_url.clone(),
            message: e.to_string(),
        })?;

        let outcome = self.search(&service, query).await;
        if let Err(e) = service.cancel().await {
            debug!("MCP session shutdown: {e}");
        }
        outcome
    }

    async fn search(
        &self,
        service: &RunningService<RoleClient, ()>,
        query: &str,
    ) -> Result<Vec<RetrievedDoc>, McpClientError> {
        let listed = service
            .list_tools(Default::default())
            .await
            .map_err(|e| McpClientError::ListTools(e.to_string()))?;
        let tools = tool_summaries(&listed);
        info!("Connected to MCP server ({} tools available)", tools.len());

        let tool = choose_search_tool(&tools).ok_or(McpClientError::NoTools)?;
        info!("Using tool: {}", tool.name);

        let params = serde_json::from_value(json!({
            "name": tool.name,
            "arguments": { "query": query },
        }))
        .map_err(|e| McpClientError::Call {
            tool: tool.name.clone(),
            message: e.to_string(),
        })?;

        let result = service
            .call_tool(params)
            .await
            .map_err(|e| McpClientError::Call {
                tool: tool.name.clone(),
                message: e.to_string(),
            })?;

        let docs = parse_tool_result(&tool.name, &result)?;
        info!("Retrieved {} documents", docs.len());
        Ok(docs)
    }
}

#[async_trait]
impl Retriever for McpRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDoc>, RetrievalError> {
        Ok(self.retrieve_docs(query).await?)
    }

    fn name(&self) -> &'static str {
        "mcp"
    }
}

/// Extract tool names/descriptions from a `tools/list` result.
pub fn tool_summaries(listed: &impl Serialize) -> Vec<ToolSummary> {
    let value = serde_json::to_value(listed).unwrap_or(Value::Null);
    value
        .get("tools")
        .and_then(|v| v.as_array())
        .map(|tools| {
            tools
                .iter()
                .filter_map(|t| {
                    let name = t.get("name")?.as_str()?.to_string();
                    let description = t
                        .get("description")
                        .and_then(|d| d.as_str())
                        .unwrap_or("")
                        .to_string();
                    Some(ToolSummary { name, description })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// First tool whose name mentions search or query, else the first tool.
pub fn choose_search_tool(tools: &[ToolSummary]) -> Option<&ToolSummary> {
    let preferred = tools.iter().find(|t| {
        let name = t.name.to_lowercase();
        name.contains("search") || name.contains("query")
    });

    if preferred.is_none() && !tools.is_empty() {
        warn!("No search tool found, available tools:");
        for t in tools {
            warn!("  - {}: {}", t.name, t.description);
        }
    }
    preferred.or_else(|| tools.first())
}

/// Turn a `tools/call` result into documents, one per content item.
pub fn parse_tool_result(
    tool: &str,
    result: &impl Serialize,
) -> Result<Vec<RetrievedDoc>, McpClientError> {
    let value = serde_json::to_value(result).unwrap_or(Value::Null);

    let texts: Vec<String> = value
        .get("content")
        .and_then(|v| v.as_array())
        .map(|items| {
            items
                .iter()
                .map(|item| match item.get("text").and_then(|t| t.as_str()) {
                    Some(text) => text.to_string(),
                    None => item.to_string(),
                })
                .filter(|text| !text.trim().is_empty())
                .collect()
        })
        .unwrap_or_default();

    let is_error = value
        .get("isError")
        .or_else(|| value.get("is_error"))
        .and_then(|v| v.as_bool())
        .unwrap_or(false);
    if is_error {
        return Err(McpClientError::Call {
            tool: tool.to_string(),
            message: texts.join("\n"),
        });
    }

    if texts.is_empty() {
        return Err(McpClientError::EmptyResult);
    }

    Ok(texts
        .into_iter()
        .map(|text| RetrievedDoc::new(text, None))
        .collect())
}
