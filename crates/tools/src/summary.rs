//! Summary tool — answers whole-document questions by tree summarization.
//!
//! Level 0 is the document's segments in order. Each level packs consecutive
//! items into groups of `fan_in`, summarizes every group concurrently, and
//! waits for the whole level before starting the next. The tree ends when a
//! single item remains.

use std::sync::Arc;

use async_trait::async_trait;
use docrouter_core::document::DocumentId;
use docrouter_core::error::{ProviderError, ToolError};
use docrouter_core::tool::{Tool, ToolResult};
use docrouter_index::SummaryView;
use futures::future::join_all;
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::naming::summary_tool_name;
use crate::synthesizer::Synthesizer;

pub const DEFAULT_FAN_IN: usize = 4;
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;

/// The final answer plus the shape of the tree that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSummary {
    pub answer: String,
    pub levels: usize,
    pub calls: usize,
}

/// Reduce `texts` to one answer.
///
/// At most `max_concurrency` oracle calls run at once within a level. A
/// single text still goes through one call so the answer addresses `query`.
pub async fn tree_summarize(
    synthesizer: &Synthesizer,
    query: &str,
    texts: Vec<String>,
    fan_in: usize,
    max_concurrency: usize,
) -> Result<TreeSummary, ProviderError> {
    if texts.is_empty() {
        return Err(ProviderError::Malformed("nothing to summarize".into()));
    }

    let fan_in = fan_in.max(2);
    let semaphore = Semaphore::new(max_concurrency.max(1));
    let mut items = texts;
    let mut levels = 0;
    let mut calls = 0;

    loop {
        let groups: Vec<&[String]> = items.chunks(fan_in).collect();
        calls += groups.len();

        let outputs = join_all(groups.into_iter().map(|group| {
            let semaphore = &semaphore;
            async move {
                let _permit = semaphore.acquire().await.ok();
                synthesizer.summarize(query, group).await
            }
        }))
        .await;

        items = outputs.into_iter().collect::<Result<Vec<_>, _>>()?;
        levels += 1;

        debug!(level = levels, remaining = items.len(), "Summary level complete");

        if items.len() == 1 {
            break;
        }
    }

    let answer = items.pop().unwrap_or_default();
    Ok(TreeSummary {
        answer,
        levels,
        calls,
    })
}

pub struct SummaryTool {
    name: String,
    description: String,
    doc_id: DocumentId,
    view: Arc<SummaryView>,
    synthesizer: Synthesizer,
    fan_in: usize,
    max_concurrency: usize,
}

impl SummaryTool {
    pub fn new(view: Arc<SummaryView>, synthesizer: Synthesizer) -> Self {
        let doc_id = view.doc_id().clone();
        Self {
            name: summary_tool_name(&doc_id),
            description: format!("Useful for summarization questions related to {doc_id}"),
            doc_id,
            view,
            synthesizer,
            fan_in: DEFAULT_FAN_IN,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    pub fn with_fan_in(mut self, fan_in: usize) -> Self {
        self.fan_in = fan_in.max(2);
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn view(&self) -> &Arc<SummaryView> {
        &self.view
    }

    pub async fn query(&self, query: &str) -> Result<String, ToolError> {
        let summary = tree_summarize(
            &self.synthesizer,
            query,
            self.view.texts(),
            self.fan_in,
            self.max_concurrency,
        )
        .await
        .map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name.clone(),
            reason: e.to_string(),
        })?;

        debug!(
            tool = %self.name,
            segments = self.view.len(),
            levels = summary.levels,
            calls = summary.calls,
            "Summary complete"
        );
        Ok(summary.answer)
    }
}

#[async_trait]
impl Tool for SummaryTool {
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
                    "description": "What to summarize about the document"
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

        let output = self.query(query).await?;
        Ok(ToolResult::ok(String::new(), output))
    }
}

impl std::fmt::Debug for SummaryTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SummaryTool")
            .field("name", &self.name)
            .field("doc_id", &self.doc_id)
            .field("fan_in", &self.fan_in)
            .finish()
    }
}
