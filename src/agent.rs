//! Query pipeline: retrieve → (web search) → generate.
use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::answer::{Answer, AnswerGenerator};
use crate::config::{Config, RetrievalMethod, RunOptions};
use crate::http::{HttpError, ReqwestTransport, Transport};
use crate::llm::LlmClient;
use crate::llm::LlmError;
use crate::llm::gemini::GeminiClient;
use crate::retrieval::map::MapRetriever;
use crate::retrieval::mcp::McpRetriever;
use crate::retrieval::{RetrievalError, Retriever};
use crate::web_search::{WebResult, WebSearcher};

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Setup(#[from] HttpError),

    #[error("missing API key: {0}")]
    MissingApiKey(&'static str),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error("answer generation failed: {0}")]
    Generation(#[from] LlmError),
}

/// Runs one query through the pipeline.
pub struct Agent {
    retriever: Box<dyn Retriever>,
    searcher: Option<WebSearcher>,
    llm: Arc<dyn LlmClient>,
}

impl Agent {
    pub fn new(
        retriever: Box<dyn Retriever>,
        searcher: Option<WebSearcher>,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            retriever,
            searcher,
            llm,
        }
    }

    /// Wire the production components for a validated configuration.
    pub fn from_config(config: &Config, run: &RunOptions) -> Result<Self, AgentError> {
        let llm_key = config
            .llm_api_key
            .clone()
            .ok_or(AgentError::MissingApiKey(crate::config::LLM_API_KEY_VAR))?;

        let fetch: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new(config.request_timeout())?);
        let llm_transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new(config.llm_timeout())?);
        let llm: Arc<dyn LlmClient> =
            Arc::new(GeminiClient::new(llm_transport, &config.llm, llm_key));

        let retriever: Box<dyn Retriever> = match run.retrieval {
            RetrievalMethod::Map => Box::new(MapRetriever::new(
                fetch.clone(),
                llm.clone(),
                config,
                run.mode,
            )),
            RetrievalMethod::Mcp => Box::new(McpRetriever::new(config.mcp_server_url.clone())),
        };

        let searcher = if run.web_search {
            let key = config
                .web_search_api_key
                .clone()
                .ok_or(AgentError::MissingApiKey(crate::config::WEB_SEARCH_API_KEY_VAR))?;
            Some(WebSearcher::new(fetch, key, config.web_search.clone()))
        } else {
            None
        };

        Ok(Self::new(retriever, searcher, llm))
    }

    /// Answer `query`. Only retrieval over MCP and answer generation can fail.
    pub async fn run(&self, query: &str) -> Result<Answer, AgentError> {
        info!("Processing query with {} retrieval", self.retriever.name());

        let docs = self.retriever.retrieve(query).await?;

        let web: Vec<WebResult> = match &self.searcher {
            Some(searcher) => searcher.search(query).await,
            None => Vec::new(),
        };

        let answer = AnswerGenerator::new(self.llm.as_ref())
            .generate(query, &docs, &web)
            .await?;
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Mode;
    use crate::llm::mock::ScriptedLlm;
    use crate::retrieval::RetrievedDoc;
    use crate::retrieval::mcp::McpClientError;
    use async_trait::async_trait;

    struct FixedRetriever(Vec<RetrievedDoc>);

    #[async_trait]
    impl Retriever for FixedRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedDoc>, RetrievalError> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct FailingRetriever;

    #[async_trait]
    impl Retriever for FailingRetriever {
        async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedDoc>, RetrievalError> {
            Err(McpClientError::NoTools.into())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    #[tokio::test]
    async fn test_answer_with_docs() {
        let llm = Arc::new(
            ScriptedLlm::new().reply(r#"{"answer": "Use MemorySaver.", "sources_used": [1]}"#),
        );
        let agent = Agent::new(
            Box::new(FixedRetriever(vec![RetrievedDoc::new(
                "MemorySaver docs",
                Some("https://docs.test/p.md".to_string()),
            )])),
            None,
            llm.clone(),
        );

        let answer = agent.run("add persistence").await.unwrap();
        assert_eq!(answer.answer, "Use MemorySaver.");
        assert_eq!(answer.official[0].url.as_deref(), Some("https://docs.test/p.md"));
        assert!(answer.web.is_empty());
        assert!(llm.requests()[0].prompt.contains("MemorySaver docs"));
    }

    #[tokio::test]
    async fn test_retrieval_failure_is_fatal() {
        let llm = Arc::new(ScriptedLlm::new());
        let agent = Agent::new(Box::new(FailingRetriever), None, llm.clone());
        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(err, AgentError::Retrieval(_)));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_mcp_server_skips_generation() {
        let llm = Arc::new(ScriptedLlm::new().reply(r#"{"answer": "unused", "sources_used": []}"#));
        let agent = Agent::new(
            Box::new(McpRetriever::new("http://127.0.0.1:9/mcp")),
            None,
            llm.clone(),
        );

        let err = agent.run("add persistence").await.unwrap_err();
        assert!(matches!(
            err,
            AgentError::Retrieval(RetrievalError::Mcp(McpClientError::Connect { .. }))
        ));
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_generation_failure_is_fatal() {
        let llm = Arc::new(ScriptedLlm::new().fail("quota"));
        let agent = Agent::new(Box::new(FixedRetriever(vec![])), None, llm);
        let err = agent.run("q").await.unwrap_err();
        assert!(matches!(err, AgentError::Generation(_)));
    }

    #[test]
    fn test_from_config_requires_llm_key() {
        let run = RunOptions {
            mode: Mode::Online,
            ..RunOptions::default()
        };
        let result = Agent::from_config(&Config::default(), &run);
        assert!(matches!(result, Err(AgentError::MissingApiKey("GEMINI_API_KEY"))));
    }

    #[test]
    fn test_from_config_builds_mcp_agent() {
        let config = Config {
            llm_api_key: Some("k".to_string()),
            web_search_api_key: Some("w".to_string()),
            ..Config::default()
        };
        let run = RunOptions {
            mode: Mode::Online,
            retrieval: RetrievalMethod::Mcp,
            web_search: true,
        };
        let agent = Agent::from_config(&config, &run).unwrap();
        assert_eq!(agent.retriever.name(), "mcp");
        assert!(agent.searcher.is_some());
    }
}
