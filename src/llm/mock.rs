/// Scripted LLM for testing purposes.
///
/// Replays queued replies in order and records every prompt it was given,
/// so pipeline tests can run without a real model.
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{LlmClient, LlmError, StructuredRequest};
use crate::http::HttpError;

enum Reply {
    Text(String),
    Failure(String),
}

/// A mock LLM that answers from a queue.
///
/// Once the queue is exhausted every call fails with
/// [`LlmError::EmptyResponse`].
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<Reply>>,
    prompts: Mutex<Vec<StructuredRequest>>,
}

impl ScriptedLlm {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful reply with the given raw JSON text.
    #[must_use]
    pub fn reply(self, text: &str) -> Self {
        self.push(Reply::Text(text.to_string()));
        self
    }

    /// Queue a transport failure.
    #[must_use]
    pub fn fail(self, message: &str) -> Self {
        self.push(Reply::Failure(message.to_string()));
        self
    }

    /// Requests received so far, in order.
    pub fn requests(&self) -> Vec<StructuredRequest> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    fn push(&self, reply: Reply) {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate_json(&self, request: &StructuredRequest) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(request.clone());
        }

        let next = self.replies.lock().ok().and_then(|mut r| r.pop_front());
        match next {
            Some(Reply::Text(text)) => Ok(text),
            Some(Reply::Failure(message)) => Err(LlmError::Http(HttpError::Network {
                url: "mock://llm".to_string(),
                message,
            })),
            None => Err(LlmError::EmptyResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order() {
        let llm = ScriptedLlm::new().reply("{}").fail("quota exceeded");
        let req = StructuredRequest::new("hello", json!({}));

        assert_eq!(llm.generate_json(&req).await.unwrap(), "{}");
        let err = llm.generate_json(&req).await.unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
        assert!(matches!(
            llm.generate_json(&req).await,
            Err(LlmError::EmptyResponse)
        ));
        assert_eq!(llm.requests().len(), 3);
        assert_eq!(llm.requests()[0].prompt, "hello");
    }
}
