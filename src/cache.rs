//! Local documentation cache.
//!
//! A plain directory tree: the manifest lives at `<data_dir>/llms.txt` and
//! each document at `<data_dir>/docs/<url path>`.
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use reqwest::Url;

/// File-backed cache keyed by document identifier.
#[derive(Debug, Clone)]
pub struct DocCache {
    manifest_path: PathBuf,
    docs_dir: PathBuf,
}

impl DocCache {
    pub fn new(manifest_path: impl Into<PathBuf>, docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            manifest_path: manifest_path.into(),
            docs_dir: docs_dir.into(),
        }
    }

    #[must_use]
    pub fn manifest_path(&self) -> &Path {
        &self.manifest_path
    }

    #[must_use]
    pub fn docs_dir(&self) -> &Path {
        &self.docs_dir
    }

    /// Read the cached manifest, if any.
    pub fn read_manifest(&self) -> io::Result<String> {
        fs::read_to_string(&self.manifest_path)
    }

    pub fn write_manifest(&self, content: &str) -> io::Result<()> {
        write_creating_parents(&self.manifest_path, content)
    }

    /// Cache file for `identifier`, or `None` if it maps to no usable path.
    #[must_use]
    pub fn doc_path(&self, identifier: &str) -> Option<PathBuf> {
        relative_doc_path(identifier).map(|rel| self.docs_dir.join(rel))
    }

    /// Read a cached document. `NotFound` if the identifier has no path.
    pub fn read_doc(&self, identifier: &str) -> io::Result<String> {
        let path = self.doc_path(identifier).ok_or_else(|| unmappable(identifier))?;
        fs::read_to_string(path)
    }

    pub fn write_doc(&self, identifier: &str, content: &str) -> io::Result<()> {
        let path = self.doc_path(identifier).ok_or_else(|| unmappable(identifier))?;
        write_creating_parents(&path, content)
    }
}

fn unmappable(identifier: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("identifier has no cache path: {identifier}"),
    )
}

fn write_creating_parents(path: &Path, content: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Relative cache path for an identifier.
///
/// URLs contribute their path; anything else is taken as a path already.
/// Only normal components survive, so the result can never escape the
/// cache root.
#[must_use]
pub fn relative_doc_path(identifier: &str) -> Option<PathBuf> {
    let identifier = identifier.trim();
    let raw_path = match Url::parse(identifier) {
        Ok(url) if url.has_host() => url.path().to_string(),
        _ => identifier
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let rel: PathBuf = Path::new(&raw_path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();

    if rel.as_os_str().is_empty() {
        None
    } else {
        Some(rel)
    }
}
