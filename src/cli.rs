//! Command-line arguments.
use clap::Parser;

use crate::config::{Mode, RetrievalMethod, RunOptions};

/// Answer a LangGraph/LangChain question from the official documentation.
#[derive(Debug, Clone, Parser)]
#[command(name = "langgraph-helper", version, about)]
pub struct Cli {
    /// The question to answer
    pub query: String,

    /// Use cached documentation only, or fetch it live
    #[arg(long, value_enum, default_value_t = Mode::Offline)]
    pub mode: Mode,

    /// How documentation is retrieved
    #[arg(long, value_enum, default_value_t = RetrievalMethod::Map)]
    pub retrieval: RetrievalMethod,

    /// Augment the context with web search results (online mode only)
    #[arg(long)]
    pub web_search: bool,

    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            mode: self.mode,
            retrieval: self.retrieval,
            web_search: self.web_search,
        }
    }

    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }
}
