//! Shared test helpers: a scripted oracle and a stub tool.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docrouter_core::error::{ProviderError, ToolError};
use docrouter_core::message::{Message, MessageToolCall};
use docrouter_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use docrouter_core::settings::Settings;
use docrouter_core::tool::{Tool, ToolResult};
use docrouter_providers::HashEmbedder;

/// A provider that replays scripted replies in order.
///
/// Once the script runs out it repeats `fallback`, or panics when there is
/// none.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    fallback: Option<ProviderResponse>,
    requests: Mutex<Vec<ProviderRequest>>,
    stalls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            requests: Mutex::new(Vec::new()),
            stalls: AtomicUsize::new(0),
        }
    }

    /// Never answer the first `n` calls.
    pub fn with_stalls(self, n: usize) -> Self {
        self.stalls.store(n, Ordering::SeqCst);
        self
    }

    pub fn replies(responses: Vec<ProviderResponse>) -> Self {
        Self::new(responses.into_iter().map(Ok).collect())
    }

    /// Always answer with `response`.
    pub fn repeating(response: ProviderResponse) -> Self {
        let mut provider = Self::new(Vec::new());
        provider.fallback = Some(response);
        provider
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);

        let stalled = self
            .stalls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stalled {
            std::future::pending::<()>().await;
        }

        if let Some(next) = self.script.lock().unwrap().pop_front() {
            return next;
        }
        match &self.fallback {
            Some(response) => Ok(response.clone()),
            None => panic!(
                "ScriptedProvider: script exhausted after {} calls",
                self.call_count()
            ),
        }
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

pub fn tool_call_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    let mut response = text_response("");
    response.message.tool_calls = tool_calls;
    response
}

pub fn tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

pub fn settings_for(provider: Arc<dyn Provider>) -> Settings {
    Settings::new(provider, Arc::new(HashEmbedder::new(256)), "mock-model")
}

/// A tool that replays scripted outcomes, then keeps returning the last one.
pub struct StubTool {
    name: String,
    description: String,
    outcomes: Mutex<VecDeque<Result<String, ToolError>>>,
    last: Mutex<Result<String, ToolError>>,
    delay: Duration,
    calls: AtomicUsize,
    arguments: Mutex<Vec<serde_json::Value>>,
}

impl StubTool {
    pub fn new(name: &str, description: &str, outcomes: Vec<Result<String, ToolError>>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            outcomes: Mutex::new(outcomes.into()),
            last: Mutex::new(Ok("ok".into())),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            arguments: Mutex::new(Vec::new()),
        }
    }

    pub fn answering(name: &str, description: &str, output: &str) -> Self {
        Self::new(name, description, vec![Ok(output.into())])
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn arguments(&self) -> Vec<serde_json::Value> {
        self.arguments.lock().unwrap().clone()
    }
}

#[async_trait]
impl Tool for StubTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": { "query": { "type": "string" } },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.arguments.lock().unwrap().push(arguments);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let outcome = {
            let next = self.outcomes.lock().unwrap().pop_front();
            let mut last = self.last.lock().unwrap();
            if let Some(next) = next {
                *last = next;
            }
            last.clone()
        };
        outcome.map(|output| ToolResult::ok(String::new(), output))
    }
}
