//! Vector query tool: answers specific questions about one document from
//! its most similar segments, optionally restricted to some pages.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use docrouter_core::document::DocumentId;
use docrouter_core::error::ToolError;
use docrouter_core::tool::{Tool, ToolResult};
use docrouter_index::{MetadataFilter, SegmentIndex};
use serde_json::Value;
use tracing::debug;

use crate::naming::vector_tool_name;
use crate::synthesizer::Synthesizer;

/// Returned when nothing in the document matches, without asking the oracle.
pub const NO_RELEVANT_CONTENT: &str = "No relevant content was found in the document for this query.";

pub struct VectorQueryTool {
    name: String,
    description: String,
    doc_id: DocumentId,
    index: Arc<SegmentIndex>,
    synthesizer: Synthesizer,
    top_k: usize,
}

impl VectorQueryTool {
    pub fn new(index: Arc<SegmentIndex>, synthesizer: Synthesizer, top_k: usize) -> Self {
        let doc_id = index.doc_id().clone();
        Self {
            name: vector_tool_name(&doc_id),
            description: format!(
                "Use to answer specific questions over the document '{doc_id}'. \
                 Always leave page_numbers as null unless there is a specific page you want to search."
            ),
            doc_id,
            index,
            synthesizer,
            top_k: top_k.max(1),
        }
    }

    pub fn index(&self) -> &Arc<SegmentIndex> {
        &self.index
    }

    /// Search the document and synthesize an answer.
    ///
    /// `None` and an empty set both search every page.
    pub async fn query(
        &self,
        query: &str,
        page_filter: Option<&BTreeSet<String>>,
    ) -> Result<String, ToolError> {
        let filter = page_filter.and_then(MetadataFilter::pages);

        let hits = self
            .index
            .search(query, self.top_k, filter.as_ref())
            .await
            .map_err(|e| self.failure(e))?;

        debug!(
            tool = %self.name,
            hits = hits.len(),
            pages = ?filter.as_ref().map(|f| &f.values),
            "Vector query"
        );

        if hits.is_empty() {
            return Ok(NO_RELEVANT_CONTENT.to_string());
        }

        let contexts: Vec<String> = hits.into_iter().map(|h| h.segment.text).collect();
        self.synthesizer
            .answer(query, &contexts)
            .await
            .map_err(|e| self.failure(e))
    }

    fn failure(&self, error: impl std::fmt::Display) -> ToolError {
        ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: error.to_string(),
        }
    }
}

/// Parse `page_numbers`: null/missing, or an array of strings or integers.
fn parse_pages(value: &Value) -> Result<Option<BTreeSet<String>>, ToolError> {
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => Ok(s.trim().to_string()),
                Value::Number(n) => Ok(n.to_string()),
                other => Err(ToolError::InvalidArguments(format!(
                    "page_numbers entries must be strings or integers, got {other}"
                ))),
            })
            .collect::<Result<BTreeSet<String>, _>>()
            .map(Some),
        other => Err(ToolError::InvalidArguments(format!(
            "page_numbers must be a list or null, got {other}"
        ))),
    }
}

#[async_trait]
impl Tool for VectorQueryTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn doc_id(&self) -> Option<&str> {
        Some(self.doc_id.as_str())
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The question to answer from the document"
                },
                "page_numbers": {
                    "type": ["array", "null"],
                    "items": { "type": "string" },
                    "description": "Restrict the search to these page labels; null searches every page"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let query = arguments["query"]
            .as_str()
            .filter(|q| !q.trim().is_empty())
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'query' argument".into()))?;

        let pages = parse_pages(&arguments["page_numbers"])?;
        let output = self.query(query, pages.as_ref()).await?;

        Ok(ToolResult::ok(String::new(), output))
    }
}

impl std::fmt::Debug for VectorQueryTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorQueryTool")
            .field("name", &self.name)
            .field("doc_id", &self.doc_id)
            .field("top_k", &self.top_k)
            .finish()
    }
}
