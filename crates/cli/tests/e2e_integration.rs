//! End-to-end integration tests for the DocRouter document agent.
//!
//! These tests exercise the full pipeline from document files to answers:
//! extraction, chunking, per-document tools, tool retrieval and the agent
//! loop, with a scripted reasoning oracle and the offline hash embedder.

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use docrouter_agent::{AgentConfig, AgentError, DocumentAssistant, TurnState};
use docrouter_config::AppConfig;
use docrouter_core::document::{DocumentId, DocumentSource, TextExtractor};
use docrouter_core::error::ProviderError;
use docrouter_core::event::{DomainEvent, EventBus};
use docrouter_core::message::{Message, MessageToolCall};
use docrouter_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use docrouter_core::settings::Settings;
use docrouter_index::{MetadataFilter, SegmentIndex};
use docrouter_ingest::{PlainTextExtractor, chunk_document};
use docrouter_providers::HashEmbedder;
use docrouter_tools::{summary_tool_name, vector_tool_name};
use tempfile::TempDir;

// ── Mock Provider ────────────────────────────────────────────────────────

/// Agent requests (those offering tools) replay the script in order.
/// Synthesis requests (no tools) echo the first numbered context entry, so
/// tool outputs are deterministic even when tools run concurrently.
struct ScriptedProvider {
    script: Mutex<VecDeque<ProviderResponse>>,
    repeat_last: bool,
    agent_calls: Mutex<usize>,
    synthesis_prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    fn new(responses: Vec<ProviderResponse>) -> Self {
        Self {
            script: Mutex::new(responses.into()),
            repeat_last: false,
            agent_calls: Mutex::new(0),
            synthesis_prompts: Mutex::new(Vec::new()),
        }
    }

    fn forever(response: ProviderResponse) -> Self {
        let mut provider = Self::new(vec![response]);
        provider.repeat_last = true;
        provider
    }

    fn agent_calls(&self) -> usize {
        *self.agent_calls.lock().unwrap()
    }

    fn synthesis_prompts(&self) -> Vec<String> {
        self.synthesis_prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        if request.tools.is_empty() {
            let prompt = request.messages[0].content.clone();
            self.synthesis_prompts.lock().unwrap().push(prompt.clone());
            let first = prompt
                .lines()
                .find_map(|l| l.strip_prefix("[1] "))
                .unwrap_or("nothing");
            return Ok(text_response(&format!("From the document: {first}")));
        }

        *self.agent_calls.lock().unwrap() += 1;
        let mut script = self.script.lock().unwrap();
        let response = if self.repeat_last && script.len() == 1 {
            script.front().cloned()
        } else {
            script.pop_front()
        };
        Ok(response.expect("ScriptedProvider exhausted"))
    }
}

fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock".into(),
    }
}

fn tool_response(tool_calls: Vec<MessageToolCall>) -> ProviderResponse {
    let mut response = text_response("");
    response.message.tool_calls = tool_calls;
    response
}

fn make_tool_call(id: &str, name: &str, args: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: id.into(),
        name: name.into(),
        arguments: serde_json::to_string(&args).unwrap(),
    }
}

fn settings(provider: Arc<ScriptedProvider>) -> Settings {
    Settings::new(provider, Arc::new(HashEmbedder::new(256)), "mock")
}

fn assistant(provider: Arc<ScriptedProvider>) -> DocumentAssistant {
    DocumentAssistant::new(settings(provider), Arc::new(EventBus::default())).with_agent_config(
        AgentConfig {
            retry_backoff: Duration::from_millis(1),
            ..AgentConfig::default()
        },
    )
}

fn write(dir: &TempDir, file: &str, text: &str) -> PathBuf {
    let path = dir.path().join(file);
    std::fs::write(&path, text).unwrap();
    path
}

// ── E2E: Question answering ──────────────────────────────────────────────

#[tokio::test]
async fn e2e_amazon_revenue_question() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "amazon.txt", "Revenue grew 10%.\u{000C}Net income fell 2%.");

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![make_tool_call(
            "call_1",
            "vector_tool_amazon",
            serde_json::json!({"query": "revenue"}),
        )]),
        text_response("Amazon's revenue grew 10%."),
    ]));
    let assistant = assistant(provider.clone());

    let report = assistant
        .process_documents(vec![DocumentSource::new("amazon", path)])
        .await;
    assert!(report.is_success());

    let turn = assistant.ask("What happened to revenue?").await;
    assert_eq!(turn.state, TurnState::Done);
    assert_eq!(turn.reasoning_steps, 2);
    assert_eq!(turn.tool_calls.len(), 1);

    // the tool searched the document and synthesized from it
    let prompts = provider.synthesis_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Query: revenue"));
    assert!(prompts[0].contains("Revenue grew 10%."));
    assert!(turn.tool_calls[0].result.starts_with("From the document:"));
    assert_eq!(turn.reply(), "Amazon's revenue grew 10%.");
}

#[tokio::test]
async fn e2e_direct_answer_no_tools() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "notes.txt", "Meeting notes.");

    let provider = Arc::new(ScriptedProvider::new(vec![text_response("Hello!")]));
    let assistant = assistant(provider.clone());
    assistant
        .process_documents(vec![DocumentSource::new("notes", path)])
        .await;

    let turn = assistant.ask("Hi there").await;
    assert_eq!(turn.state, TurnState::Done);
    assert_eq!(turn.reasoning_steps, 1);
    assert!(turn.tool_calls.is_empty());
    assert_eq!(provider.agent_calls(), 1);
}

#[tokio::test]
async fn e2e_questions_spanning_two_documents() {
    let dir = TempDir::new().unwrap();
    let amazon = write(
        &dir,
        "amazon.txt",
        "Net sales increased 12%.\u{000C}AWS grew 13%.\u{000C}Headcount fell.",
    );
    let google = write(&dir, "google.txt", "Search revenue rose 5%.");

    let provider = Arc::new(ScriptedProvider::new(vec![
        tool_response(vec![
            make_tool_call(
                "call_1",
                "vector_tool_amazon",
                serde_json::json!({"query": "growth", "page_numbers": ["2"]}),
            ),
            make_tool_call(
                "call_2",
                "summary_tool_google",
                serde_json::json!({"query": "Summarize the report"}),
            ),
        ]),
        text_response("AWS grew 13% while Google search revenue rose 5%."),
    ]));
    let assistant = assistant(provider.clone());
    let report = assistant
        .process_documents(vec![
            DocumentSource::new("amazon", amazon),
            DocumentSource::new("google", google),
        ])
        .await;
    assert_eq!(report.processed.len(), 2);
    assert_eq!(assistant.tool_names().await.len(), 4);

    let turn = assistant.ask("Compare amazon and google growth").await;
    assert!(turn.succeeded());

    let results: Vec<&str> = turn.tool_calls.iter().map(|r| r.result.as_str()).collect();
    assert_eq!(
        results,
        vec![
            "From the document: AWS grew 13%.",
            "From the document: Search revenue rose 5%."
        ]
    );
}

#[tokio::test]
async fn e2e_turn_limit_terminates_the_loop() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "amazon.txt", "Revenue grew 10%.");

    let provider = Arc::new(ScriptedProvider::forever(tool_response(vec![make_tool_call(
        "call_1",
        "vector_tool_amazon",
        serde_json::json!({"query": "revenue"}),
    )])));
    let assistant = assistant(provider.clone());
    assistant
        .process_documents(vec![DocumentSource::new("amazon", path)])
        .await;

    let turn = assistant.ask("What happened to revenue?").await;
    assert_eq!(turn.state, TurnState::Failed);
    assert!(matches!(
        turn.failure,
        Some(AgentError::TurnLimitExceeded { limit: 10 })
    ));
    assert_eq!(provider.agent_calls(), 10);
    assert!(turn.reply().contains("10 reasoning steps"));
}

// ── E2E: Processing and retrieval ────────────────────────────────────────

#[tokio::test]
async fn e2e_page_filter_or_semantics() {
    let dir = TempDir::new().unwrap();
    let pages: Vec<String> = (1..=6).map(|i| format!("Quarterly revenue page {i}.")).collect();
    let path = write(&dir, "report.txt", &pages.join("\u{000C}"));

    let document = PlainTextExtractor::new().extract(&path).await.unwrap();
    let doc_id = DocumentId::new("report").unwrap();
    let segments = chunk_document(&document, &doc_id, 1024).unwrap();
    assert_eq!(segments.len(), 6);

    let index = SegmentIndex::build(doc_id, segments, Arc::new(HashEmbedder::new(256)), 8)
        .await
        .unwrap();

    let wanted = BTreeSet::from(["3".to_string(), "5".to_string()]);
    let filter = MetadataFilter::pages(&wanted).unwrap();
    let hits = index.search("quarterly revenue", 10, Some(&filter)).await.unwrap();
    let labels: BTreeSet<String> = hits
        .iter()
        .filter_map(|h| h.segment.metadata.page_label.clone())
        .collect();
    assert_eq!(labels, wanted);

    // an empty filter set means no filter
    assert!(MetadataFilter::pages(&BTreeSet::<String>::new()).is_none());
    let all = index.search("quarterly revenue", 10, None).await.unwrap();
    assert_eq!(all.len(), 6);
}

#[tokio::test]
async fn e2e_offline_processing_from_config() {
    let dir = TempDir::new().unwrap();
    let amazon = write(&dir, "amazon.txt", "Revenue grew 10%.");
    let weather = write(&dir, "weather.txt", "Rain is expected.");

    let mut config = AppConfig::default();
    config.embedding.provider = "hash".into();
    config.retrieval.tool_top_k = 2;
    assert!(config.validate().is_ok());

    let settings = docrouter_providers::build_settings(&config);
    assert_eq!(settings.embedder.name(), "hash");
    assert_eq!(settings.model, "gpt-4o");

    let bus = Arc::new(EventBus::default());
    let mut rx = bus.subscribe();
    let assistant = DocumentAssistant::from_config(&config, settings, bus);

    let report = assistant
        .process_documents(vec![
            DocumentSource::new("amazon", amazon),
            DocumentSource::new("weather", weather),
            DocumentSource::new("amazon", dir.path().join("dup.txt")),
        ])
        .await;
    assert_eq!(report.processed.len(), 2);
    assert_eq!(report.failed.len(), 1);

    let tools = assistant.retrieve_tools("amazon revenue").await.unwrap();
    assert_eq!(tools.len(), 2);
    assert!(tools.iter().all(|t| t.ends_with("_amazon")));

    let mut processed = 0;
    let mut failed = 0;
    while let Ok(event) = rx.try_recv() {
        match event.as_ref() {
            DomainEvent::DocumentProcessed { .. } => processed += 1,
            DomainEvent::DocumentFailed { .. } => failed += 1,
            _ => {}
        }
    }
    assert_eq!((processed, failed), (2, 1));
}

#[test]
fn e2e_tool_names_never_collide() {
    let ids = ["amazon", "a b", "a_b", "a-b", "été", "report 2023"];
    let mut names = BTreeSet::new();
    for id in ids {
        let doc_id = DocumentId::new(id).unwrap();
        assert!(names.insert(vector_tool_name(&doc_id)));
        assert!(names.insert(summary_tool_name(&doc_id)));
    }
    assert_eq!(names.len(), ids.len() * 2);

    let digested = vector_tool_name(&DocumentId::new("report v1").unwrap());
    let lookalike = DocumentId::new(&digested["vector_tool_".len()..]).unwrap();
    assert_ne!(vector_tool_name(&lookalike), digested);
}

#[test]
fn e2e_config_defaults_and_validation() {
    let config = AppConfig::default();
    assert_eq!(config.default_model, "gpt-4o");
    assert_eq!(config.agent.max_turns, 10);
    assert_eq!(config.retrieval.tool_top_k, 3);
    assert_eq!(config.retrieval.segment_top_k, 2);
    assert!(config.validate().is_ok());

    let agent = AgentConfig::from_app(&config);
    assert_eq!(agent.max_turns, 10);
    assert_eq!(agent.tool_top_k, 3);
    assert!(agent.system_prompt.contains("Do not rely on prior knowledge"));
}
