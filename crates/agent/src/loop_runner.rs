//! The agent reasoning loop implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use docrouter_config::AppConfig;
use docrouter_core::error::{ProviderError, ToolError};
use docrouter_core::event::{DomainEvent, EventBus};
use docrouter_core::message::{Conversation, Message, MessageToolCall};
use docrouter_core::provider::ToolDefinition;
use docrouter_core::settings::Settings;
use docrouter_core::tool::{Tool, ToolResult};
use docrouter_index::ToolRegistryIndex;
use futures::future::join_all;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::prompt::system_prompt;
use crate::turn::{AgentError, AgentTurn, ToolCallRecord, TurnState};

/// A failing tool is tried at most this many times per call.
const TOOL_ATTEMPTS: u32 = 2;

/// Limits and policies for one run of the loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Oracle calls allowed per question. Retries count only after a timeout.
    pub max_turns: u32,
    pub tool_top_k: usize,
    pub oracle_timeout: Duration,
    pub tool_timeout: Duration,
    /// Extra attempts after a failed oracle call.
    pub oracle_retries: u32,
    pub retry_backoff: Duration,
    pub parallel_tool_calls: bool,
    pub system_prompt: String,
}

impl AgentConfig {
    pub fn from_app(config: &AppConfig) -> Self {
        Self {
            max_turns: config.agent.max_turns,
            tool_top_k: config.retrieval.tool_top_k,
            oracle_timeout: config.agent.oracle_timeout(),
            tool_timeout: config.agent.tool_timeout(),
            oracle_retries: config.agent.oracle_retries,
            retry_backoff: config.agent.retry_backoff(),
            parallel_tool_calls: config.agent.parallel_tool_calls,
            system_prompt: system_prompt(config.agent.system_prompt.as_deref()),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::from_app(&AppConfig::default())
    }
}

/// What the oracle asked for in one reasoning step.
#[derive(Debug, Clone, PartialEq)]
pub enum OracleDecision {
    ToolCalls(Vec<MessageToolCall>),
    FinalAnswer(String),
}

impl OracleDecision {
    /// Interpret an assistant message. Tool calls win over text; a reply
    /// with neither is malformed.
    pub fn from_message(message: &Message) -> Result<Self, ProviderError> {
        if message.has_tool_calls() {
            return Ok(Self::ToolCalls(message.tool_calls.clone()));
        }
        let answer = message.content.trim();
        if answer.is_empty() {
            return Err(ProviderError::Malformed(
                "reply has neither tool calls nor an answer".into(),
            ));
        }
        Ok(Self::FinalAnswer(answer.to_string()))
    }
}

/// Runs one question at a time against a read-only tool registry.
pub struct AgentLoop {
    settings: Settings,
    registry: Arc<ToolRegistryIndex>,
    config: AgentConfig,
    event_bus: Arc<EventBus>,
}

impl AgentLoop {
    pub fn new(settings: Settings, registry: Arc<ToolRegistryIndex>, event_bus: Arc<EventBus>) -> Self {
        Self {
            settings,
            registry,
            config: AgentConfig::default(),
            event_bus,
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_max_turns(mut self, max: u32) -> Self {
        self.config.max_turns = max;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Answer `query`, returning the turn in a terminal state.
    pub async fn run(&self, query: &str) -> AgentTurn {
        let mut turn = AgentTurn::new(query);
        info!(turn_id = %turn.id, "Processing question");

        match self.drive(&mut turn).await {
            Ok(answer) => {
                turn.final_answer = Some(answer);
                turn.enter(TurnState::Done);
            }
            Err(e) => {
                warn!(turn_id = %turn.id, error = %e, "Turn failed");
                turn.failure = Some(e);
                turn.enter(TurnState::Failed);
            }
        }

        self.event_bus.publish(DomainEvent::TurnCompleted {
            turn_id: turn.id.clone(),
            succeeded: turn.succeeded(),
            reasoning_steps: turn.reasoning_steps,
            tool_calls: turn.tool_calls.len(),
            timestamp: Utc::now(),
        });
        info!(
            turn_id = %turn.id,
            state = ?turn.state,
            reasoning_steps = turn.reasoning_steps,
            tool_calls = turn.tool_calls.len(),
            "Turn complete"
        );
        turn
    }

    async fn drive(&self, turn: &mut AgentTurn) -> Result<String, AgentError> {
        let query = turn.query.trim().to_string();
        if query.is_empty() {
            return Err(AgentError::EmptyQuery);
        }

        turn.enter(TurnState::RetrievingTools);
        let mut active = self.registry.retrieve(&query, self.config.tool_top_k).await?;
        turn.retrieved_tools = active.iter().map(|t| t.name().to_string()).collect();
        turn.history = Conversation::with_question(&self.config.system_prompt, &query);

        loop {
            if turn.reasoning_steps >= self.config.max_turns {
                return Err(AgentError::TurnLimitExceeded {
                    limit: self.config.max_turns,
                });
            }

            turn.enter(TurnState::Reasoning);
            turn.reasoning_steps += 1;
            debug!(turn_id = %turn.id, iteration = turn.reasoning_steps, "Agent loop iteration");

            let definitions: Vec<ToolDefinition> = active.iter().map(|t| t.to_definition()).collect();
            let (message, decision) = self
                .consult_oracle(&turn.history, &mut turn.reasoning_steps, definitions)
                .await?;
            turn.history.push(message);

            let calls = match decision {
                OracleDecision::FinalAnswer(answer) => return Ok(answer),
                OracleDecision::ToolCalls(calls) => calls,
            };

            let mut resolved = Vec::with_capacity(calls.len());
            for call in &calls {
                resolved.push(self.resolve(&call.name, &mut active, turn));
            }

            turn.enter(TurnState::ExecutingTool);
            debug!(tool_count = calls.len(), "Executing tool calls");
            let records = self.execute_all(&calls, resolved).await;

            for record in records {
                turn.history
                    .push(Message::tool_result(&record.call_id, &record.result));
                turn.tool_calls.push(record);
            }
        }
    }

    /// Find a requested tool, pulling it into the active set when the
    /// oracle names a registered tool that retrieval did not offer.
    fn resolve(
        &self,
        name: &str,
        active: &mut Vec<Arc<dyn Tool>>,
        turn: &mut AgentTurn,
    ) -> Option<Arc<dyn Tool>> {
        if let Some(tool) = active.iter().find(|t| t.name() == name) {
            return Some(tool.clone());
        }

        let tool = self.registry.get(name)?;
        turn.enter(TurnState::RetrievingTools);
        debug!(tool = %name, "Adding tool outside the retrieved set");
        active.push(tool.clone());
        turn.retrieved_tools.push(name.to_string());
        Some(tool)
    }

    /// One reasoning step, retried on failure with backoff.
    ///
    /// A retry after a timeout is a new consultation: it takes a step from
    /// `steps` and is refused once the turn limit is reached.
    async fn consult_oracle(
        &self,
        history: &Conversation,
        steps: &mut u32,
        tools: Vec<ToolDefinition>,
    ) -> Result<(Message, OracleDecision), AgentError> {
        let attempts = self.config.oracle_retries + 1;
        let mut attempt = 0;
        let mut timed_out = false;

        loop {
            attempt += 1;
            if timed_out {
                if *steps >= self.config.max_turns {
                    return Err(AgentError::TurnLimitExceeded {
                        limit: self.config.max_turns,
                    });
                }
                *steps += 1;
            }
            let request = self.settings.request(history.messages.clone(), tools.clone());

            let outcome = match tokio::time::timeout(
                self.config.oracle_timeout,
                self.settings.provider.complete(request),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(format!(
                    "no reply within {}s",
                    self.config.oracle_timeout.as_secs()
                ))),
            };

            let outcome = outcome.and_then(|response| {
                if let Some(usage) = &response.usage {
                    self.event_bus.publish(DomainEvent::ResponseGenerated {
                        model: response.model.clone(),
                        tokens_used: usage.total_tokens,
                        timestamp: Utc::now(),
                    });
                }
                let decision = OracleDecision::from_message(&response.message)?;
                Ok((response.message, decision))
            });

            match outcome {
                Ok(step) => return Ok(step),
                Err(e) if attempt < attempts && is_retryable(&e) => {
                    let delay = retry_delay(&e, self.config.retry_backoff);
                    warn!(
                        attempt,
                        error = %e,
                        delay_ms = delay.as_millis() as u64,
                        "Oracle call failed, retrying"
                    );
                    timed_out = matches!(e, ProviderError::Timeout(_));
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Execute calls concurrently or in order; results keep request order.
    async fn execute_all(
        &self,
        calls: &[MessageToolCall],
        tools: Vec<Option<Arc<dyn Tool>>>,
    ) -> Vec<ToolCallRecord> {
        let jobs = calls
            .iter()
            .zip(tools)
            .map(|(call, tool)| self.execute_call(call, tool));

        if self.config.parallel_tool_calls {
            join_all(jobs).await
        } else {
            let mut records = Vec::with_capacity(calls.len());
            for job in jobs {
                records.push(job.await);
            }
            records
        }
    }

    async fn execute_call(&self, call: &MessageToolCall, tool: Option<Arc<dyn Tool>>) -> ToolCallRecord {
        let start = Instant::now();
        let parsed = parse_arguments(&call.arguments);
        let args = parsed
            .as_ref()
            .map(Clone::clone)
            .unwrap_or_else(|_| Value::String(call.arguments.clone()));

        let (outcome, attempts) = match (tool, parsed) {
            (None, _) => (Err(ToolError::NotFound(call.name.clone())), 0),
            (Some(_), Err(e)) => (Err(e), 0),
            (Some(tool), Ok(args)) => self.invoke(tool.as_ref(), args).await,
        };
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool execution failed");
                ToolResult::failed(&call.id, &e)
            }
        };

        self.event_bus.publish(DomainEvent::ToolExecuted {
            tool_name: call.name.clone(),
            success: result.success,
            duration_ms,
            timestamp: Utc::now(),
        });

        ToolCallRecord {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            args,
            result: result.output,
            success: result.success,
            attempts,
            duration_ms,
        }
    }

    /// Run a tool with a timeout, retrying once on a transient failure.
    async fn invoke(&self, tool: &dyn Tool, args: Value) -> (Result<ToolResult, ToolError>, u32) {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let outcome = match tokio::time::timeout(self.config.tool_timeout, tool.execute(args.clone())).await {
                Ok(result) => result,
                Err(_) => Err(ToolError::Timeout {
                    tool_name: tool.name().to_string(),
                    timeout_secs: self.config.tool_timeout.as_secs(),
                }),
            };

            match outcome {
                Err(e) if attempt < TOOL_ATTEMPTS && !matches!(e, ToolError::InvalidArguments(_)) => {
                    warn!(tool = %tool.name(), attempt, error = %e, "Tool call failed, retrying");
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                outcome => return (outcome, attempt),
            }
        }
    }
}

/// Blank arguments mean "no arguments".
fn parse_arguments(raw: &str) -> Result<Value, ToolError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(raw)
        .map_err(|e| ToolError::InvalidArguments(format!("arguments are not valid JSON: {e}")))
}

/// The provider's requested wait for rate limits, never less than `backoff`.
fn retry_delay(error: &ProviderError, backoff: Duration) -> Duration {
    match error {
        ProviderError::RateLimited { retry_after_secs } => backoff.max(Duration::from_secs(*retry_after_secs)),
        _ => backoff,
    }
}

fn is_retryable(error: &ProviderError) -> bool {
    !matches!(
        error,
        ProviderError::AuthenticationFailed(_)
            | ProviderError::ModelNotFound(_)
            | ProviderError::NotConfigured(_)
    )
}
