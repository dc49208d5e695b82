//! Answer generation with source attribution.
use std::collections::BTreeSet;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::info;

use crate::llm::{self, LlmClient, LlmError, StructuredRequest};
use crate::retrieval::RetrievedDoc;
use crate::web_search::WebResult;

const SEPARATOR_WIDTH: usize = 80;

const OFFICIAL_ONLY_INFO: &str = "All documents provided are official local documentation.";

const MIXED_SOURCES_INFO: &str = "Document Types:
- Local documentation (official, current, authoritative)
- Web search results (may include outdated content)

IMPORTANT: Prioritize local documentation over web search results.
If web results contradict local documentation, trust the local docs and note the discrepancy.
If web results mention deprecated features, explicitly identify them as deprecated.
Refer to sources with generic terms like \"the official documentation\" in the answer text; use document numbers only in sources_used.";

const NO_CONTEXT_INFO: &str = "No documentation was retrieved for this question. \
Answer from general knowledge only if you are confident, say clearly that no documentation \
was available, and return an empty sources_used array.";

/// A cited source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// `None` for documents returned by the MCP server.
    pub url: Option<String>,
}

/// Final structured answer for one query.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Answer {
    pub answer: String,
    pub official: Vec<Source>,
    pub web: Vec<Source>,
}

impl Answer {
    #[must_use]
    pub fn has_sources(&self) -> bool {
        !self.official.is_empty() || !self.web.is_empty()
    }
}

#[derive(Deserialize)]
struct AnswerResponse {
    answer: String,
    #[serde(default)]
    sources_used: Vec<i64>,
}

pub fn answer_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "answer": {
                "type": "STRING",
                "description": "Comprehensive answer in markdown format"
            },
            "sources_used": {
                "type": "ARRAY",
                "items": { "type": "INTEGER" },
                "description": "Document numbers (1-indexed) actually used"
            }
        },
        "required": ["answer", "sources_used"]
    })
}

/// Number every document (official first, then web) into one context block.
pub fn format_context(docs: &[RetrievedDoc], web: &[WebResult]) -> String {
    let separator = "=".repeat(SEPARATOR_WIDTH);
    let mut parts = Vec::new();

    for (i, doc) in docs.iter().enumerate() {
        parts.push(format!("[Document {}]", i + 1));
        if let Some(url) = &doc.url {
            parts.push(format!("URL: {url}"));
        }
        parts.push(format!("\n{}\n", doc.content));
        parts.push(separator.clone());
    }

    for (i, result) in web.iter().enumerate() {
        parts.push(format!("[Document {}: Web Search Result]", docs.len() + i + 1));
        parts.push(format!("URL: {}", result.url));
        if !result.title.is_empty() {
            parts.push(format!("Title: {}", result.title));
        }
        parts.push(format!("\n{}\n", result.snippet));
        parts.push(separator.clone());
    }

    parts.join("\n\n")
}

fn answer_prompt(query: &str, info: &str, context: &str) -> String {
    format!(
        r#"You are a helpful assistant that answers questions about LangGraph and LangChain based on official documentation.

User Question: {query}

{info}

Documentation Context:
{context}

Instructions:
- Answer the user's question using ONLY the provided documentation
- Be specific and provide code examples if present in the docs
- If the documentation doesn't fully answer the question, say so
- Format your answer clearly with markdown
- In sources_used, list ONLY the document numbers you actually referenced in your answer
- If you reference deprecated features found in web results, explicitly note they are deprecated

Return your response as JSON with:
- "answer": your complete answer in markdown
- "sources_used": array of document numbers that you actually used"#
    )
}

fn build_prompt(query: &str, docs: &[RetrievedDoc], web: &[WebResult]) -> String {
    let (info, context) = if docs.is_empty() && web.is_empty() {
        (NO_CONTEXT_INFO, "(none)".to_string())
    } else if web.is_empty() {
        (OFFICIAL_ONLY_INFO, format_context(docs, web))
    } else {
        (MIXED_SOURCES_INFO, format_context(docs, web))
    };

    answer_prompt(query, info, &context)
}

/// Split cited document numbers into official and web sources.
///
/// Numbers are de-duplicated and sorted; anything outside both ranges is
/// dropped.
pub fn resolve_sources(
    cited: &[i64],
    docs: &[RetrievedDoc],
    web: &[WebResult],
) -> (Vec<Source>, Vec<Source>) {
    let unique: BTreeSet<i64> = cited.iter().copied().collect();
    let n_docs = docs.len() as i64;
    let n_web = web.len() as i64;

    let mut official = Vec::new();
    let mut web_sources = Vec::new();
    for n in unique {
        if (1..=n_docs).contains(&n) {
            official.push(Source {
                url: docs[(n - 1) as usize].url.clone(),
            });
        } else if (n_docs + 1..=n_docs + n_web).contains(&n) {
            web_sources.push(Source {
                url: Some(web[(n - n_docs - 1) as usize].url.clone()),
            });
        }
    }
    (official, web_sources)
}

/// Produces the final answer from the gathered context.
pub struct AnswerGenerator<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> AnswerGenerator<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    /// One LLM call; its failure is the query's failure.
    pub async fn generate(
        &self,
        query: &str,
        docs: &[RetrievedDoc],
        web: &[WebResult],
    ) -> Result<Answer, LlmError> {
        info!("Generating answer...");
        let request = StructuredRequest::new(build_prompt(query, docs, web), answer_schema());
        let response: AnswerResponse = llm::generate(self.llm, &request).await?;

        let (official, web_sources) = resolve_sources(&response.sources_used, docs, web);
        Ok(Answer {
            answer: response.answer,
            official,
            web: web_sources,
        })
    }
}
