//! `llms.txt` manifest loading and parsing.
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::DocCache;
use crate::config::Mode;
use crate::http::{HttpError, Transport};

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("llms.txt not found at {path}: {source}")]
    NotCached {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot fetch llms.txt online ({fetch}) and no local copy at {path}")]
    Unavailable { path: String, fetch: HttpError },
}

/// One `- [Title](url): description` line of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub title: String,
    pub url: String,
    pub description: Option<String>,
}

/// The documentation index handed to the selector.
#[derive(Debug, Clone, Default)]
pub struct Manifest {
    text: String,
    entries: Vec<ManifestEntry>,
}

static ENTRY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*[-*]\s*\[(?P<title>[^\]]+)\]\((?P<url>[^)\s]+)\)(?:\s*:\s*(?P<desc>.*))?$")
        .expect("valid manifest entry regex")
});

impl Manifest {
    /// Wrap raw manifest text, extracting whatever entries parse.
    #[must_use]
    pub fn parse(text: impl Into<String>) -> Self {
        let text = text.into();
        let entries = text
            .lines()
            .filter_map(|line| ENTRY_RE.captures(line))
            .map(|caps| ManifestEntry {
                title: caps["title"].trim().to_string(),
                url: caps["url"].to_string(),
                description: caps
                    .name("desc")
                    .map(|d| d.as_str().trim().to_string())
                    .filter(|d| !d.is_empty()),
            })
            .collect();
        Self { text, entries }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether `identifier` is listed verbatim in the parsed entries.
    #[must_use]
    pub fn lists(&self, identifier: &str) -> bool {
        self.entries.iter().any(|e| e.url == identifier)
    }
}

/// Obtains the manifest from the cache or the network.
pub struct ManifestLoader<'a> {
    transport: &'a dyn Transport,
    cache: &'a DocCache,
    url: &'a str,
}

impl<'a> ManifestLoader<'a> {
    pub fn new(transport: &'a dyn Transport, cache: &'a DocCache, url: &'a str) -> Self {
        Self {
            transport,
            cache,
            url,
        }
    }

    /// Offline: read the cache. Online: fetch, cache, and fall back to the
    /// cached copy on failure.
    pub async fn load(&self, mode: Mode) -> Result<Manifest, ManifestError> {
        let text = match mode {
            Mode::Offline => self.read_cached()?,
            Mode::Online => self.fetch_live().await?,
        };
        let manifest = Manifest::parse(text);
        info!("Manifest loaded ({} entries)", manifest.entries().len());
        Ok(manifest)
    }

    fn read_cached(&self) -> Result<String, ManifestError> {
        self.cache
            .read_manifest()
            .map_err(|source| ManifestError::NotCached {
                path: self.cache.manifest_path().display().to_string(),
                source,
            })
    }

    async fn fetch_live(&self) -> Result<String, ManifestError> {
        info!("Fetching llms.txt from {}", self.url);
        match self.transport.get_text(self.url).await {
            Ok(content) => {
                match self.cache.write_manifest(&content) {
                    Ok(()) => info!("Cached llms.txt locally"),
                    Err(e) => warn!("Failed to cache llms.txt: {e}"),
                }
                Ok(content)
            }
            Err(fetch) => {
                warn!("Failed to fetch llms.txt online: {fetch}");
                match self.cache.read_manifest() {
                    Ok(content) => {
                        info!("Using local llms.txt as fallback");
                        Ok(content)
                    }
                    Err(_) => Err(ManifestError::Unavailable {
                        path: self.cache.manifest_path().display().to_string(),
                        fetch,
                    }),
                }
            }
        }
    }
}
