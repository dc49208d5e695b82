//! Google Gemini `generateContent` client with JSON structured output.
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use super::{LlmClient, LlmError, StructuredRequest};
use crate::config::LlmConfig;
use crate::http::Transport;

/// Gemini REST client.
pub struct GeminiClient {
    transport: Arc<dyn Transport>,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: &LlmConfig,
        api_key: impl Into<String>,
    ) -> Self {
        let endpoint = format!(
            "{}/models/{}:generateContent",
            config.api_base.trim_end_matches('/'),
            config.model
        );
        Self {
            transport,
            endpoint,
            api_key: api_key.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn request_body(request: &StructuredRequest) -> Value {
    let mut generation_config = json!({
        "responseMimeType": "application/json",
        "responseSchema": request.schema,
    });
    if let Some(t) = request.temperature {
        generation_config["temperature"] = json!(t);
    }

    json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "generationConfig": generation_config,
    })
}

// ── Response shape ───────────────────────────────────────────────────

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn extract_text(value: Value) -> Result<String, LlmError> {
    let resp: GenerateResponse = serde_json::from_value(value)?;

    if let Some(reason) = resp.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::Blocked(reason));
    }

    let candidate = resp.candidates.into_iter().next().ok_or(LlmError::EmptyResponse)?;
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        let reason = candidate.finish_reason.unwrap_or_default();
        return match reason.as_str() {
            "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" => Err(LlmError::Blocked(reason.clone())),
            _ => Err(LlmError::EmptyResponse),
        };
    }

    Ok(text)
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_json(&self, request: &StructuredRequest) -> Result<String, LlmError> {
        debug!("Gemini request: {} prompt chars", request.prompt.len());
        let body = request_body(request);
        let resp = self
            .transport
            .post_json(&self.endpoint, &[("x-goog-api-key", self.api_key.as_str())], &body)
            .await?;
        extract_text(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpError;
    use crate::http::mock::RecordingTransport;

    const ENDPOINT: &str =
        "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent";

    fn client(transport: Arc<RecordingTransport>) -> GeminiClient {
        GeminiClient::new(transport, &LlmConfig::default(), "secret")
    }

    #[test]
    fn test_endpoint_from_config() {
        let config = LlmConfig {
            api_base: "https://llm.test/v1beta/".to_string(),
            model: "gemini-x".to_string(),
            ..LlmConfig::default()
        };
        let client = GeminiClient::new(Arc::new(RecordingTransport::new()), &config, "k");
        assert_eq!(client.endpoint(), "https://llm.test/v1beta/models/gemini-x:generateContent");
    }

    #[tokio::test]
    async fn test_sends_schema_and_key() {
        let transport = Arc::new(RecordingTransport::new().with_json(
            ENDPOINT,
            json!({"candidates": [{"content": {"parts": [{"text": "{\"answer\":\"ok\"}"}]}}]}),
        ));
        let gemini = client(transport.clone());

        let req = StructuredRequest::new("question", json!({"type": "OBJECT"})).temperature(0.0);
        let text = gemini.generate_json(&req).await.unwrap();
        assert_eq!(text, "{\"answer\":\"ok\"}");

        let sent = &transport.requests()[0];
        assert_eq!(
            sent.headers,
            vec![("x-goog-api-key".to_string(), "secret".to_string())]
        );
        let body = sent.body.as_ref().unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "question");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(body["generationConfig"]["responseSchema"]["type"], "OBJECT");
        assert_eq!(body["generationConfig"]["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_joins_multiple_parts() {
        let transport = Arc::new(RecordingTransport::new().with_json(
            ENDPOINT,
            json!({"candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": "1}"}]}}]}),
        ));
        let text = client(transport)
            .generate_json(&StructuredRequest::new("q", json!({})))
            .await
            .unwrap();
        assert_eq!(text, "{\"a\":1}");
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let transport = Arc::new(RecordingTransport::new().with_json(
            ENDPOINT,
            json!({"promptFeedback": {"blockReason": "SAFETY"}}),
        ));
        let err = client(transport)
            .generate_json(&StructuredRequest::new("q", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Blocked(reason) if reason == "SAFETY"));
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let transport = Arc::new(RecordingTransport::new().with_json(ENDPOINT, json!({})));
        let err = client(transport)
            .generate_json(&StructuredRequest::new("q", json!({})))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_http_failure_propagates() {
        let transport = Arc::new(RecordingTransport::new().with_json_error(
            ENDPOINT,
            HttpError::Status {
                url: ENDPOINT.to_string(),
                status: 429,
                detail: "Resource has been exhausted".to_string(),
            },
        ));
        let err = client(transport)
            .generate_json(&StructuredRequest::new("q", json!({})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("status 429: Resource has been exhausted"));
        assert!(matches!(err, LlmError::Http(e) if e.status() == Some(429)));
    }
}
