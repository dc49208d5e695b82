//! LLM-driven selection of documents from the manifest.
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::llm::{self, LlmClient, StructuredRequest};
use crate::manifest::Manifest;

/// Upper bound on selected documents.
pub const MAX_SELECTED: usize = 3;

/// Identifiers chosen for one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentSelection {
    pub identifiers: Vec<String>,
    pub reasoning: String,
}

impl DocumentSelection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
}

#[derive(Deserialize)]
struct SelectionResponse {
    urls: Vec<String>,
    #[serde(default)]
    reasoning: String,
}

pub fn selection_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "urls": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "minItems": 1,
                "maxItems": MAX_SELECTED,
                "description": "List of 2-3 most relevant documentation URLs"
            },
            "reasoning": {
                "type": "STRING",
                "description": "Why these documents were selected"
            }
        },
        "required": ["urls", "reasoning"]
    })
}

fn build_prompt(manifest: &Manifest, query: &str) -> String {
    let manifest = manifest.text();
    format!(
        r#"You are a helpful assistant that selects the most relevant documentation for answering user queries about LangGraph and LangChain.

Given the following resource map (llms.txt) and a user query, select 2-3 most relevant documentation URLs that would help answer the query.

Resource Map:
{manifest}

User Query: {query}

Return your response as a JSON object with exactly this structure:
{{"urls": ["url1", "url2", "url3"], "reasoning": "brief explanation of why these documents were selected"}}

Use the URLs exactly as they appear in the resource map."#
    )
}

/// Trim, drop blanks and duplicates, keep order, cap at [`MAX_SELECTED`].
fn normalize(urls: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_SELECTED);
    for url in urls {
        let url = url.trim();
        if url.is_empty() || out.iter().any(|u| u == url) {
            continue;
        }
        out.push(url.to_string());
        if out.len() == MAX_SELECTED {
            break;
        }
    }
    out
}

/// Asks the LLM which manifest entries answer the query.
pub struct DocumentSelector<'a> {
    llm: &'a dyn LlmClient,
}

impl<'a> DocumentSelector<'a> {
    pub fn new(llm: &'a dyn LlmClient) -> Self {
        Self { llm }
    }

    /// Select up to [`MAX_SELECTED`] identifiers.
    ///
    /// Never fails: any LLM or parsing problem yields an empty selection.
    pub async fn select(&self, manifest: &Manifest, query: &str) -> DocumentSelection {
        if manifest.is_empty() {
            warn!("Manifest is empty, skipping document selection");
            return DocumentSelection::default();
        }

        let request = StructuredRequest::new(build_prompt(manifest, query), selection_schema())
            .temperature(0.0);

        let response: SelectionResponse = match llm::generate(self.llm, &request).await {
            Ok(r) => r,
            Err(e) => {
                warn!("Document selection failed: {e}");
                warn!("Continuing without local documentation");
                return DocumentSelection::default();
            }
        };

        let identifiers = normalize(response.urls);
        if identifiers.is_empty() {
            warn!("LLM selected no documents");
        }
        for id in &identifiers {
            if !manifest.lists(id) {
                debug!("Selected identifier not listed verbatim in manifest: {id}");
            }
        }

        info!("Selected {} documents", identifiers.len());
        DocumentSelection {
            identifiers,
            reasoning: response.reasoning,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedLlm;

    fn manifest() -> Manifest {
        Manifest::parse(
            "- [Persistence](https://docs.test/persistence.md): Checkpointers\n\
             - [Streaming](https://docs.test/streaming.md): Stream tokens\n\
             - [Memory](https://docs.test/memory.md): Long-term memory\n",
        )
    }

    #[test]
    fn test_normalize() {
        let urls = vec![
            " a ".to_string(),
            String::new(),
            "a".to_string(),
            "b".to_string(),
            "c".to_string(),
            "d".to_string(),
        ];
        assert_eq!(normalize(urls), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_prompt_contains_manifest_and_query() {
        let prompt = build_prompt(&manifest(), "add persistence to a LangGraph agent");
        assert!(prompt.contains("https://docs.test/persistence.md"));
        assert!(prompt.contains("User Query: add persistence to a LangGraph agent"));
    }

    #[test]
    fn test_prompt_keeps_manifest_braces_verbatim() {
        let manifest =
            Manifest::parse("- [Templates](https://docs.test/t.md): use {query} placeholders\n");
        let prompt = build_prompt(&manifest, "QUERY_MARKER");
        assert!(prompt.contains("use {query} placeholders"));
        assert_eq!(prompt.matches("QUERY_MARKER").count(), 1);
        assert!(prompt.contains(r#"{"urls": ["url1", "url2", "url3"]"#));
    }

    #[test]
    fn test_schema_bounds() {
        let schema = selection_schema();
        assert_eq!(schema["properties"]["urls"]["maxItems"], 3);
        assert_eq!(schema["properties"]["urls"]["minItems"], 1);
    }

    #[tokio::test]
    async fn test_select_returns_bounded_list() {
        let llm = ScriptedLlm::new().reply(
            r#"{"urls": ["https://docs.test/persistence.md", "https://docs.test/memory.md",
                "https://docs.test/streaming.md", "https://docs.test/extra.md"],
                "reasoning": "persistence is covered by checkpointers"}"#,
        );
        let selection = DocumentSelector::new(&llm)
            .select(&manifest(), "add persistence to a LangGraph agent")
            .await;

        assert!((1..=MAX_SELECTED).contains(&selection.identifiers.len()));
        assert_eq!(selection.identifiers[0], "https://docs.test/persistence.md");
        assert_eq!(selection.reasoning, "persistence is covered by checkpointers");

        let sent = &llm.requests()[0];
        assert_eq!(sent.temperature, Some(0.0));
        assert_eq!(sent.schema, selection_schema());
    }

    #[tokio::test]
    async fn test_llm_failure_degrades_to_empty() {
        let llm = ScriptedLlm::new().fail("503 Service Unavailable");
        let selection = DocumentSelector::new(&llm).select(&manifest(), "q").await;
        assert!(selection.is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_reply_degrades_to_empty() {
        let llm = ScriptedLlm::new().reply("not json at all");
        let selection = DocumentSelector::new(&llm).select(&manifest(), "q").await;
        assert!(selection.is_empty());
    }

    #[tokio::test]
    async fn test_empty_manifest_skips_llm() {
        let llm = ScriptedLlm::new();
        let selection = DocumentSelector::new(&llm)
            .select(&Manifest::parse(""), "q")
            .await;
        assert!(selection.is_empty());
        assert!(llm.requests().is_empty());
    }
}
