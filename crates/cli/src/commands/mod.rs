pub mod chat;
pub mod doctor;
pub mod index;
pub mod onboard;

use std::path::PathBuf;
use std::sync::Arc;

use docrouter_agent::{DocumentAssistant, ProcessingReport};
use docrouter_config::AppConfig;
use docrouter_core::document::DocumentSource;
use docrouter_core::event::{DomainEvent, EventBus};

/// Parse `NAME=PATH`. The name may not be blank; the path is taken verbatim.
pub fn parse_doc_arg(arg: &str) -> Result<DocumentSource, String> {
    let (name, path) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=PATH, got '{arg}'"))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(format!("document name is empty in '{arg}'"));
    }
    if path.trim().is_empty() {
        return Err(format!("document path is empty in '{arg}'"));
    }
    Ok(DocumentSource::new(name, PathBuf::from(path)))
}

pub fn parse_doc_args(args: &[String]) -> Result<Vec<DocumentSource>, String> {
    args.iter().map(|a| parse_doc_arg(a)).collect()
}

pub fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    config.validate()?;
    Ok(config)
}

/// Build an assistant from config with events logged at debug level.
pub fn build_assistant(config: &AppConfig) -> DocumentAssistant {
    let settings = docrouter_providers::build_settings(config);
    let event_bus = Arc::new(EventBus::default());
    spawn_event_logger(&event_bus);
    DocumentAssistant::from_config(config, settings, event_bus)
}

fn spawn_event_logger(event_bus: &EventBus) {
    let mut rx = event_bus.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            match event.as_ref() {
                DomainEvent::ToolExecuted {
                    tool_name,
                    success,
                    duration_ms,
                    ..
                } => tracing::debug!(tool = %tool_name, success, duration_ms, "Tool executed"),
                DomainEvent::ResponseGenerated { model, tokens_used, .. } => {
                    tracing::debug!(model = %model, tokens_used, "Oracle replied")
                }
                other => tracing::debug!(event = ?other, "Domain event"),
            }
        }
    });
}

pub fn print_report(report: &ProcessingReport) {
    for doc in &report.processed {
        let note = if doc.replaced { " (replaced)" } else { "" };
        println!(
            "  ✅ {}: {} segments, tools: {}{note}",
            doc.doc_id,
            doc.segments,
            doc.tools.join(", ")
        );
        if let Some(e) = &doc.summary_error {
            println!("     ⚠️  no summary tool: {e}");
        }
    }
    for failed in &report.failed {
        println!("  ❌ {}: {}", failed.name, failed.error);
    }
}
