/// Configuration module for langgraph-helper.
///
/// Handles loading, validating, and providing default configuration values.
/// Endpoint and cache settings come from an optional JSON file; API keys come
/// from the environment; the run options come from the command line.
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable holding the Gemini API key.
pub const LLM_API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Environment variable holding the Tavily API key.
pub const WEB_SEARCH_API_KEY_VAR: &str = "WEB_SEARCH_API_KEY";

const MANIFEST_FILENAME: &str = "llms.txt";
const DOCS_SUBDIR: &str = "docs";

// ── Default value functions ──────────────────────────────────────────

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_llms_txt_url() -> String {
    "https://docs.langchain.com/llms.txt".to_string()
}

fn default_docs_base_url() -> String {
    "https://docs.langchain.com".to_string()
}

fn default_mcp_server_url() -> String {
    "https://docs.langchain.com/mcp".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_llm_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_llm_api_base() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_search_endpoint() -> String {
    "https://api.tavily.com/search".to_string()
}

fn default_max_results() -> usize {
    3
}

fn default_recency_days() -> u32 {
    180
}

fn default_exclude_domains() -> Vec<String> {
    vec!["youtube.com".to_string(), "youtu.be".to_string()]
}

// ── Run options ──────────────────────────────────────────────────────

/// Whether remote fetches are attempted at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Mode {
    /// Local cache only
    #[default]
    Offline,
    /// Fetch live docs, falling back to the cache
    Online,
}

/// Document retrieval strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum RetrievalMethod {
    /// LLM selection from the llms.txt manifest
    #[default]
    Map,
    /// Hosted documentation server over MCP
    Mcp,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Offline => "offline",
            Mode::Online => "online",
        })
    }
}

impl fmt::Display for RetrievalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RetrievalMethod::Map => "map",
            RetrievalMethod::Mcp => "mcp",
        })
    }
}

/// Per-invocation options chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunOptions {
    pub mode: Mode,
    pub retrieval: RetrievalMethod,
    pub web_search: bool,
}

impl RunOptions {
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.mode == Mode::Online
    }
}

// ── Config structs ───────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Cache root holding `llms.txt` and the `docs/` tree.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    #[serde(default = "default_llms_txt_url")]
    pub llms_txt_url: String,

    /// Base URL for manifest identifiers that are not absolute URLs.
    #[serde(default = "default_docs_base_url")]
    pub docs_base_url: String,

    #[serde(default = "default_mcp_server_url")]
    pub mcp_server_url: String,

    /// Timeout for manifest and document fetches.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub llm: LlmConfig,

    #[serde(default)]
    pub web_search: WebSearchConfig,

    #[serde(skip)]
    pub llm_api_key: Option<String>,

    #[serde(skip)]
    pub web_search_api_key: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default = "default_llm_api_base")]
    pub api_base: String,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebSearchConfig {
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Only results published within this many days are returned.
    #[serde(default = "default_recency_days")]
    pub recency_days: u32,

    #[serde(default = "default_exclude_domains")]
    pub exclude_domains: Vec<String>,
}

// ── Default impls ────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            llms_txt_url: default_llms_txt_url(),
            docs_base_url: default_docs_base_url(),
            mcp_server_url: default_mcp_server_url(),
            request_timeout_secs: default_request_timeout_secs(),
            llm: LlmConfig::default(),
            web_search: WebSearchConfig::default(),
            llm_api_key: None,
            web_search_api_key: None,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_llm_model(),
            api_base: default_llm_api_base(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            max_results: default_max_results(),
            recency_days: default_recency_days(),
            exclude_domains: default_exclude_domains(),
        }
    }
}

// ── Validation errors ────────────────────────────────────────────────

/// A single configuration problem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssue {
    #[error("MCP retrieval requires online mode.\n  Use: --mode online --retrieval mcp")]
    McpRequiresOnline,

    #[error("Web search requires online mode.\n  Use: --mode online --web-search")]
    WebSearchRequiresOnline,

    #[error(
        "Missing GEMINI_API_KEY environment variable.\n  Get an API key from: https://aistudio.google.com/app/apikey\n  Add it to your .env file or set it as an environment variable."
    )]
    MissingLlmApiKey,

    #[error(
        "Missing WEB_SEARCH_API_KEY when --web-search is used.\n  Either add WEB_SEARCH_API_KEY to your .env file or remove --web-search."
    )]
    MissingWebSearchApiKey,

    #[error("Documentation index not found: {}\n  Run once with --mode online to populate the cache.", .0.display())]
    ManifestMissing(PathBuf),

    #[error("Documentation directory is empty: {}\n  Run once with --mode online to populate the cache.", .0.display())]
    DocsDirEmpty(PathBuf),

    #[error("{0} must be positive")]
    NotPositive(&'static str),
}

/// Every problem found by [`Config::validate`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{}", format_issues(.0))]
pub struct ConfigError(pub Vec<ConfigIssue>);

fn format_issues(issues: &[ConfigIssue]) -> String {
    let rule = "=".repeat(60);
    let mut out = format!("Configuration Error:\n{rule}\n");
    for issue in issues {
        out.push_str(&format!("\n{issue}\n"));
    }
    out.push_str(&format!("\n{rule}"));
    out
}

impl ConfigError {
    #[must_use]
    pub fn contains(&self, issue: &ConfigIssue) -> bool {
        self.0.contains(issue)
    }
}

// ── Config implementation ────────────────────────────────────────────

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If the file does not exist, returns the default config. Invalid JSON
    /// is reported and replaced by defaults.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            return Ok(Self::default());
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Fill API keys from the process environment (after `.env` is loaded).
    #[must_use]
    pub fn with_env_keys(self) -> Self {
        self.with_keys_from(|name| std::env::var(name).ok())
    }

    /// Fill API keys using `lookup`; blank values count as missing.
    #[must_use]
    pub fn with_keys_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        self.llm_api_key = non_blank(LLM_API_KEY_VAR);
        self.web_search_api_key = non_blank(WEB_SEARCH_API_KEY_VAR);
        self
    }

    /// Path of the cached manifest.
    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        Path::new(&self.data_dir).join(MANIFEST_FILENAME)
    }

    /// Root of the cached documentation tree.
    #[must_use]
    pub fn docs_dir(&self) -> PathBuf {
        Path::new(&self.data_dir).join(DOCS_SUBDIR)
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    #[must_use]
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }

    /// Check the configuration against the requested run.
    ///
    /// Only touches the local filesystem; every problem is collected so the
    /// user can fix them in one go.
    pub fn validate(&self, run: &RunOptions) -> Result<(), ConfigError> {
        let mut issues = Vec::new();

        if run.retrieval == RetrievalMethod::Mcp && !run.is_online() {
            issues.push(ConfigIssue::McpRequiresOnline);
        }

        if run.web_search && !run.is_online() {
            issues.push(ConfigIssue::WebSearchRequiresOnline);
        }

        if self.llm_api_key.is_none() {
            issues.push(ConfigIssue::MissingLlmApiKey);
        }

        if run.web_search && self.web_search_api_key.is_none() {
            issues.push(ConfigIssue::MissingWebSearchApiKey);
        }

        if run.retrieval == RetrievalMethod::Map && !run.is_online() {
            let manifest = self.manifest_path();
            if !manifest.is_file() {
                issues.push(ConfigIssue::ManifestMissing(manifest));
            }

            let docs = self.docs_dir();
            if !dir_has_entries(&docs) {
                issues.push(ConfigIssue::DocsDirEmpty(docs));
            }
        }

        if self.request_timeout_secs == 0 {
            issues.push(ConfigIssue::NotPositive("request_timeout_secs"));
        }
        if self.llm.timeout_secs == 0 {
            issues.push(ConfigIssue::NotPositive("llm.timeout_secs"));
        }
        if run.web_search && self.web_search.max_results == 0 {
            issues.push(ConfigIssue::NotPositive("web_search.max_results"));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError(issues))
        }
    }
}

fn dir_has_entries(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}

// ── Tests ────────────────────────────────────────────────────────────
