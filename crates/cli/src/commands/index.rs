//! `docrouter index` — Process documents and show the tools built for them.

use super::{build_assistant, load_config, parse_doc_args, print_report};

pub async fn run(docs: Vec<String>, query: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    // Processing only needs the embedding oracle
    if !config.embedding.is_local() {
        config.require_api_key()?;
    }

    let sources = parse_doc_args(&docs)?;
    let assistant = build_assistant(&config);

    println!("📚 Processing {} document(s)...", sources.len());
    let report = assistant.process_documents(sources).await;
    print_report(&report);

    let tools = assistant.tool_names().await;
    println!("\n🔧 Registered tools ({}):", tools.len());
    for name in &tools {
        println!("  - {name}");
    }

    if let Some(query) = query {
        let retrieved = assistant
            .retrieve_tools(&query)
            .await
            .map_err(|e| format!("Tool retrieval failed: {e}"))?;
        println!("\n🔎 Tools for \"{query}\":");
        for (rank, name) in retrieved.iter().enumerate() {
            println!("  {}. {name}", rank + 1);
        }
    }

    if report.processed.is_empty() {
        return Err("No documents were processed.".into());
    }
    Ok(())
}
