//! One question's journey through the agent loop.

use chrono::{DateTime, Utc};
use docrouter_core::error::{IndexBuildError, ProviderError};
use docrouter_core::message::Conversation;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Where a turn is in the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnState {
    AwaitingQuery,
    RetrievingTools,
    Reasoning,
    ExecutingTool,
    Done,
    Failed,
}

impl TurnState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Why a turn ended in [`TurnState::Failed`].
#[derive(Debug, Clone, Error)]
pub enum AgentError {
    #[error("Reasoning oracle failed: {0}")]
    Oracle(#[from] ProviderError),

    #[error("No final answer after {limit} reasoning steps")]
    TurnLimitExceeded { limit: u32 },

    #[error("Tool retrieval failed: {0}")]
    Retrieval(#[from] IndexBuildError),

    #[error("The question is empty")]
    EmptyQuery,
}

/// One executed tool call, in the order the oracle requested it.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallRecord {
    pub call_id: String,
    pub tool_name: String,
    /// Parsed arguments, or the raw string when it was not valid JSON.
    pub args: serde_json::Value,
    pub result: String,
    pub success: bool,
    /// 0 when the call was rejected before execution.
    pub attempts: u32,
    pub duration_ms: u64,
}

/// The full record of answering one question.
#[derive(Debug, Clone)]
pub struct AgentTurn {
    pub id: String,
    pub query: String,
    /// Names of the tools offered to the oracle, retrieval order first.
    pub retrieved_tools: Vec<String>,
    pub tool_calls: Vec<ToolCallRecord>,
    pub final_answer: Option<String>,
    pub state: TurnState,
    pub failure: Option<AgentError>,
    pub reasoning_steps: u32,
    /// Every state entered, in order.
    pub trace: Vec<TurnState>,
    /// Messages exchanged with the oracle; kept on failure for diagnostics.
    pub history: Conversation,
    pub started_at: DateTime<Utc>,
}

impl AgentTurn {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query: query.into(),
            retrieved_tools: Vec::new(),
            tool_calls: Vec::new(),
            final_answer: None,
            state: TurnState::AwaitingQuery,
            failure: None,
            reasoning_steps: 0,
            trace: vec![TurnState::AwaitingQuery],
            history: Conversation::new(),
            started_at: Utc::now(),
        }
    }

    pub(crate) fn enter(&mut self, state: TurnState) {
        self.state = state;
        self.trace.push(state);
    }

    pub fn succeeded(&self) -> bool {
        self.state == TurnState::Done
    }

    /// A plain-text message for the user, for either terminal state.
    pub fn reply(&self) -> String {
        if let Some(answer) = &self.final_answer {
            return answer.clone();
        }

        match &self.failure {
            Some(AgentError::TurnLimitExceeded { limit }) => format!(
                "I couldn't reach an answer within {limit} reasoning steps. \
                 Try asking a narrower question."
            ),
            Some(AgentError::Oracle(_)) => {
                "The language model is unavailable right now, so I couldn't answer. Please try again."
                    .into()
            }
            Some(AgentError::Retrieval(_)) => {
                "I couldn't search the processed documents right now. Please try again.".into()
            }
            Some(AgentError::EmptyQuery) => "Please ask a question.".into(),
            None => String::new(),
        }
    }
}
