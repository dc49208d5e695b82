/// LLM client trait and shared types for structured (JSON) generation.
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::http::HttpError;

/// Errors that can occur while talking to the LLM.
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("LLM request failed: {0}")]
    Http(#[from] HttpError),

    #[error("LLM blocked the prompt: {0}")]
    Blocked(String),

    #[error("LLM returned no content")]
    EmptyResponse,

    #[error("LLM response did not match the expected schema: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// A prompt whose answer must be a JSON document matching `schema`.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    pub prompt: String,
    /// Response schema in the OpenAPI subset understood by the provider.
    pub schema: Value,
    pub temperature: Option<f32>,
}

impl StructuredRequest {
    pub fn new(prompt: impl Into<String>, schema: Value) -> Self {
        Self {
            prompt: prompt.into(),
            schema,
            temperature: None,
        }
    }

    #[must_use]
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// Trait for structured-output LLM backends.
///
/// Implementations must be `Send + Sync` to allow use behind `Arc`.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Run the request and return the raw JSON text produced by the model.
    async fn generate_json(&self, request: &StructuredRequest) -> Result<String, LlmError>;
}

/// Run `request` and deserialize the model output into `T`.
pub async fn generate<T: DeserializeOwned>(
    client: &dyn LlmClient,
    request: &StructuredRequest,
) -> Result<T, LlmError> {
    let raw = client.generate_json(request).await?;
    let trimmed = strip_code_fence(&raw);
    if trimmed.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(serde_json::from_str(trimmed)?)
}

/// Models occasionally wrap JSON in a markdown fence despite the schema.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}
