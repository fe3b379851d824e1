//! Document tool factory. Turns one document's segments into its vector
//! query tool and summary tool.

use std::sync::Arc;

use docrouter_core::document::{DocumentId, Segment};
use docrouter_core::error::IndexBuildError;
use docrouter_core::settings::Settings;
use docrouter_core::tool::Tool;
use docrouter_index::{SegmentIndex, SummaryView};
use tracing::{info, warn};

use crate::summary::{DEFAULT_FAN_IN, DEFAULT_MAX_CONCURRENCY, SummaryTool};
use crate::synthesizer::Synthesizer;
use crate::vector_query::VectorQueryTool;

/// The tools built for one document.
#[derive(Debug)]
pub struct DocumentTools {
    pub doc_id: DocumentId,
    pub vector: Arc<VectorQueryTool>,
    /// `None` when the document had no segments to summarize.
    pub summary: Option<Arc<SummaryTool>>,
    /// Why `summary` is missing.
    pub summary_error: Option<IndexBuildError>,
    pub segment_count: usize,
}

impl DocumentTools {
    /// Every tool, vector tool first.
    pub fn tools(&self) -> Vec<Arc<dyn Tool>> {
        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(2);
        tools.push(self.vector.clone());
        if let Some(summary) = &self.summary {
            tools.push(summary.clone());
        }
        tools
    }

    pub fn names(&self) -> Vec<String> {
        self.tools().iter().map(|t| t.name().to_string()).collect()
    }
}

/// Builds document tools with shared oracle settings.
#[derive(Debug, Clone)]
pub struct ToolFactory {
    settings: Settings,
    segment_top_k: usize,
    fan_in: usize,
    max_concurrency: usize,
    embed_batch_size: usize,
}

impl ToolFactory {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            segment_top_k: 2,
            fan_in: DEFAULT_FAN_IN,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            embed_batch_size: 64,
        }
    }

    pub fn with_segment_top_k(mut self, k: usize) -> Self {
        self.segment_top_k = k.max(1);
        self
    }

    pub fn with_fan_in(mut self, fan_in: usize) -> Self {
        self.fan_in = fan_in.max(2);
        self
    }

    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.max(1);
        self
    }

    pub fn with_embed_batch_size(mut self, size: usize) -> Self {
        self.embed_batch_size = size.max(1);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Build the vector tool and, when the document has text, the summary tool.
    ///
    /// Embedding failures abort; an empty document still yields a vector
    /// tool over an empty index and reports why no summary tool exists.
    pub async fn make_tools(
        &self,
        doc_id: DocumentId,
        segments: Vec<Segment>,
    ) -> Result<DocumentTools, IndexBuildError> {
        let segment_count = segments.len();

        let index = SegmentIndex::build(
            doc_id.clone(),
            segments.clone(),
            self.settings.embedder.clone(),
            self.embed_batch_size,
        )
        .await?;

        let synthesizer = Synthesizer::new(self.settings.clone());
        let vector = Arc::new(VectorQueryTool::new(
            Arc::new(index),
            synthesizer.clone(),
            self.segment_top_k,
        ));

        let (summary, summary_error) = match SummaryView::build(doc_id.clone(), segments) {
            Ok(view) => {
                let tool = SummaryTool::new(Arc::new(view), synthesizer)
                    .with_fan_in(self.fan_in)
                    .with_max_concurrency(self.max_concurrency);
                (Some(Arc::new(tool)), None)
            }
            Err(e) => {
                warn!(doc_id = %doc_id, error = %e, "No summary tool for document");
                (None, Some(e))
            }
        };

        info!(doc_id = %doc_id, segments = segment_count, "Built document tools");

        Ok(DocumentTools {
            doc_id,
            vector,
            summary,
            summary_error,
            segment_count,
        })
    }
}
