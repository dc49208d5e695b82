//! Fetches selected documents, using the local cache as store and fallback.
use tracing::{info, warn};

use super::RetrievedDoc;
use crate::cache::DocCache;
use crate::config::Mode;
use crate::http::Transport;

/// Resolves identifiers to document bodies.
pub struct DocumentFetcher<'a> {
    transport: &'a dyn Transport,
    cache: &'a DocCache,
    base_url: &'a str,
    mode: Mode,
}

impl<'a> DocumentFetcher<'a> {
    pub fn new(
        transport: &'a dyn Transport,
        cache: &'a DocCache,
        base_url: &'a str,
        mode: Mode,
    ) -> Self {
        Self {
            transport,
            cache,
            base_url,
            mode,
        }
    }

    /// Full URL for an identifier; relative identifiers hang off the base URL.
    #[must_use]
    pub fn full_url(&self, identifier: &str) -> String {
        if identifier.starts_with("http://") || identifier.starts_with("https://") {
            identifier.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                identifier.trim_start_matches('/')
            )
        }
    }

    /// Fetch every identifier, skipping the ones that cannot be resolved.
    /// Order of the input is preserved.
    pub async fn fetch_all(&self, identifiers: &[String]) -> Vec<RetrievedDoc> {
        let mut docs = Vec::with_capacity(identifiers.len());
        for id in identifiers {
            if let Some(doc) = self.fetch(id).await {
                docs.push(doc);
            }
        }
        docs
    }

    /// Fetch one document; `None` means it was skipped.
    pub async fn fetch(&self, identifier: &str) -> Option<RetrievedDoc> {
        if self.cache.doc_path(identifier).is_none() {
            warn!("Skipping identifier with no usable path: {identifier:?}");
            return None;
        }

        match self.mode {
            Mode::Offline => self.read_cached(identifier),
            Mode::Online => self.fetch_live(identifier).await,
        }
    }

    fn read_cached(&self, identifier: &str) -> Option<RetrievedDoc> {
        match self.cache.read_doc(identifier) {
            Ok(content) => {
                info!("Retrieved from cache: {identifier}");
                Some(RetrievedDoc::new(content, Some(identifier.to_string())))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Document not found locally: {identifier}");
                None
            }
            Err(e) => {
                warn!("Error reading cached {identifier}: {e}");
                None
            }
        }
    }

    async fn fetch_live(&self, identifier: &str) -> Option<RetrievedDoc> {
        let url = self.full_url(identifier);
        info!("Fetching {url}");

        match self.transport.get_text(&url).await {
            Ok(content) => {
                if let Err(e) = self.cache.write_doc(identifier, &content) {
                    warn!("Failed to cache {identifier}: {e}");
                }
                Some(RetrievedDoc::new(content, Some(identifier.to_string())))
            }
            Err(e) => {
                warn!("Failed to fetch {identifier} online: {e}");
                let cached = self.read_cached(identifier);
                if cached.is_some() {
                    info!("Using local copy of {identifier} as fallback");
                }
                cached
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::RecordingTransport;

    const BASE: &str = "https://docs.test";
    const PERSISTENCE: &str = "https://docs.test/oss/langgraph/persistence.md";

    fn cache(dir: &std::path::Path) -> DocCache {
        DocCache::new(dir.join("llms.txt"), dir.join("docs"))
    }

    #[test]
    fn test_full_url() {
        let transport = RecordingTransport::new();
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(temp.path());
        let fetcher = DocumentFetcher::new(&transport, &cache, "https://docs.test/", Mode::Online);

        assert_eq!(fetcher.full_url(PERSISTENCE), PERSISTENCE);
        assert_eq!(
            fetcher.full_url("/oss/langgraph/persistence.md"),
            "https://docs.test/oss/langgraph/persistence.md"
        );
        assert_eq!(
            fetcher.full_url("oss/langgraph/persistence.md"),
            "https://docs.test/oss/langgraph/persistence.md"
        );
    }

    #[tokio::test]
    async fn test_offline_reads_cache_only() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(temp.path());
        cache.write_doc(PERSISTENCE, "# Persistence").unwrap();
        let transport = RecordingTransport::new().with_text(PERSISTENCE, "remote");
        let fetcher = DocumentFetcher::new(&transport, &cache, BASE, Mode::Offline);

        let docs = fetcher
            .fetch_all(&[PERSISTENCE.to_string(), "https://docs.test/missing.md".to_string()])
            .await;

        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "# Persistence");
        assert_eq!(docs[0].url.as_deref(), Some(PERSISTENCE));
        assert!(transport.urls().is_empty());
    }

    #[tokio::test]
    async fn test_online_success_writes_cache() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(temp.path());
        let transport = RecordingTransport::new().with_text(PERSISTENCE, "# Fresh");
        let fetcher = DocumentFetcher::new(&transport, &cache, BASE, Mode::Online);

        let doc = fetcher.fetch(PERSISTENCE).await.unwrap();
        assert_eq!(doc.content, "# Fresh");
        assert_eq!(cache.read_doc(PERSISTENCE).unwrap(), "# Fresh");
    }

    #[tokio::test]
    async fn test_online_failure_falls_back_to_cache() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(temp.path());
        cache.write_doc(PERSISTENCE, "# Cached").unwrap();
        let transport = RecordingTransport::new().with_status(PERSISTENCE, 502);
        let fetcher = DocumentFetcher::new(&transport, &cache, BASE, Mode::Online);

        let doc = fetcher.fetch(PERSISTENCE).await.unwrap();
        assert_eq!(doc.content, "# Cached");
        assert_eq!(transport.urls(), vec![PERSISTENCE]);
    }

    #[tokio::test]
    async fn test_online_failure_without_cache_skips() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(temp.path());
        let transport = RecordingTransport::new();
        let fetcher = DocumentFetcher::new(&transport, &cache, BASE, Mode::Online);

        assert!(fetcher.fetch(PERSISTENCE).await.is_none());
    }

    #[tokio::test]
    async fn test_unmappable_identifier_skipped_without_request() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(temp.path());
        let transport = RecordingTransport::new();
        let fetcher = DocumentFetcher::new(&transport, &cache, BASE, Mode::Online);

        assert!(fetcher.fetch("https://docs.test/").await.is_none());
        assert!(transport.urls().is_empty());
    }

    #[tokio::test]
    async fn test_relative_identifier_fetched_from_base() {
        let temp = tempfile::tempdir().unwrap();
        let cache = cache(temp.path());
        let transport =
            RecordingTransport::new().with_text("https://docs.test/oss/intro.md", "# Intro");
        let fetcher = DocumentFetcher::new(&transport, &cache, BASE, Mode::Online);

        let doc = fetcher.fetch("oss/intro.md").await.unwrap();
        assert_eq!(doc.url.as_deref(), Some("oss/intro.md"));
        assert!(temp.path().join("docs/oss/intro.md").is_file());
    }
}
