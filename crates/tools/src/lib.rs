//! Per-document tools for DocRouter.
//!
//! Every processed document contributes two tools: a [`VectorQueryTool`]
//! for specific questions (optionally restricted to some pages) and a
//! [`SummaryTool`] for whole-document questions. Tool names derive
//! deterministically from the document id.

pub mod factory;
pub mod naming;
pub mod summary;
pub mod synthesizer;
pub mod vector_query;

#[cfg(test)]
pub(crate) mod testing;

pub use factory::{DocumentTools, ToolFactory};
pub use naming::{summary_tool_name, vector_tool_name};
pub use summary::{SummaryTool, TreeSummary, tree_summarize};
pub use synthesizer::Synthesizer;
pub use vector_query::{NO_RELEVANT_CONTENT, VectorQueryTool};
