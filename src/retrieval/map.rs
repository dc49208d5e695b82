//! Map-based retrieval: manifest → LLM selection → fetch.
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::fetcher::DocumentFetcher;
use super::selector::DocumentSelector;
use super::{RetrievalError, RetrievedDoc, Retriever};
use crate::cache::DocCache;
use crate::config::{Config, Mode};
use crate::http::Transport;
use crate::llm::LlmClient;
use crate::manifest::ManifestLoader;

pub struct MapRetriever {
    transport: Arc<dyn Transport>,
    llm: Arc<dyn LlmClient>,
    cache: DocCache,
    llms_txt_url: String,
    docs_base_url: String,
    mode: Mode,
}

impl MapRetriever {
    pub fn new(
        transport: Arc<dyn Transport>,
        llm: Arc<dyn LlmClient>,
        config: &Config,
        mode: Mode,
    ) -> Self {
        Self {
            transport,
            llm,
            cache: DocCache::new(config.manifest_path(), config.docs_dir()),
            llms_txt_url: config.llms_txt_url.clone(),
            docs_base_url: config.docs_base_url.clone(),
            mode,
        }
    }
}

#[async_trait]
impl Retriever for MapRetriever {
    /// Never fails: every stage degrades to fewer (possibly zero) documents.
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDoc>, RetrievalError> {
        info!("Retrieving relevant documentation...");

        let loader = ManifestLoader::new(self.transport.as_ref(), &self.cache, &self.llms_txt_url);
        let manifest = match loader.load(self.mode).await {
            Ok(m) => m,
            Err(e) => {
                warn!("{e}");
                warn!("Continuing without local documentation");
                return Ok(Vec::new());
            }
        };

        let selection = DocumentSelector::new(self.llm.as_ref())
            .select(&manifest, query)
            .await;
        if !selection.reasoning.is_empty() {
            info!("Reasoning: {}", selection.reasoning);
        }

        let fetcher = DocumentFetcher::new(
            self.transport.as_ref(),
            &self.cache,
            &self.docs_base_url,
            self.mode,
        );
        let docs = fetcher.fetch_all(&selection.identifiers).await;

        if docs.is_empty() {
            warn!("No documents could be retrieved");
        } else {
            info!("Retrieved {} of {} selected documents", docs.len(), selection.identifiers.len());
        }
        Ok(docs)
    }

    fn name(&self) -> &'static str {
        "map"
    }
}
