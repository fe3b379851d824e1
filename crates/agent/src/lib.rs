//! The tool-routing agent — the heart of DocRouter.
//!
//! A question moves through an explicit state machine:
//!
//! 1. **Retrieve** the few tools whose descriptions best match the question
//! 2. **Reason**: send the system prompt, history and tool schemas to the oracle
//! 3. **If tool calls**: execute them, append the results, go back to step 2
//! 4. **If text**: that is the final answer
//!
//! The loop ends in `Done` with an answer or in `Failed` when the oracle
//! keeps failing or the reasoning step limit is reached.
//!
//! [`DocumentAssistant`] owns the processing pipeline that turns documents
//! into the tools the loop routes between.

pub mod assistant;
pub mod loop_runner;
pub mod prompt;
pub mod registry;
pub mod turn;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use assistant::{
    Catalog, DocumentAssistant, FailedDocument, ProcessedDocument, ProcessingError, ProcessingReport,
};
pub use loop_runner::{AgentConfig, AgentLoop, OracleDecision};
pub use prompt::DEFAULT_SYSTEM_PROMPT;
pub use registry::{DocumentEntry, DocumentRegistry};
pub use turn::{AgentError, AgentTurn, ToolCallRecord, TurnState};
