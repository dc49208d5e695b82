//! # langgraph-helper: LangGraph/LangChain documentation assistant
//!
//! Answers one question per invocation from the official documentation,
//! citing the documents the answer used.
//!
//! ## Architecture
//!
//! - **[`config`]**: JSON configuration, API keys from the environment, validation
//! - **[`cli`]**: Command-line arguments
//! - **[`http`]**: HTTP transport seam (reqwest in production, recorded in tests)
//! - **[`cache`]**: On-disk cache for the manifest and documents
//! - **[`manifest`]**: `llms.txt` parsing and loading with cache fallback
//! - **[`llm`]**: Structured-output LLM client (Gemini)
//! - **[`retrieval`]**: Manifest-based and MCP-based document retrieval
//! - **[`web_search`]**: Optional web search augmentation (Tavily)
//! - **[`answer`]**: Context assembly, answer generation, source attribution
//! - **[`agent`]**: The query pipeline
//! - **[`presenter`]**: Plain-text output

pub mod agent;
pub mod answer;
pub mod cache;
pub mod cli;
pub mod config;
pub mod http;
pub mod llm;
pub mod manifest;
pub mod presenter;
pub mod retrieval;
pub mod web_search;
