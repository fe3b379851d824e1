//! `docrouter chat` — Single-question or interactive chat over documents.

use std::io::Write;

use docrouter_agent::{AgentTurn, DocumentAssistant};
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{build_assistant, load_config, parse_doc_args, print_report};

const EXIT_WORDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

pub async fn run(docs: Vec<String>, message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    config.require_api_key()?;

    let sources = parse_doc_args(&docs)?;
    let assistant = build_assistant(&config);

    eprintln!("  Processing {} document(s)...", sources.len());
    let report = assistant.process_documents(sources).await;
    print_report(&report);
    if report.processed.is_empty() {
        return Err("No documents were processed; nothing to chat about.".into());
    }

    if let Some(msg) = message {
        eprint!("  Thinking...");
        let turn = assistant.ask(&msg).await;
        eprint!("\r              \r");
        println!("{}", turn.reply());
        if !turn.succeeded() {
            return Err(format!("Question failed: {:?}", turn.state).into());
        }
        return Ok(());
    }

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║        DocRouter — Interactive Mode          ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Provider:   {}", config.default_provider);
    println!("  Model:      {}", config.default_model);
    println!("  Documents:  {}", report.processed.len());
    println!("  Tools:      {}", assistant.tool_names().await.len());
    println!();
    println!("  Type your question and press Enter.");
    println!("  Type 'exit' or Ctrl+C to quit.");
    println!();

    interactive(&assistant).await?;

    println!();
    println!("  Goodbye! 👋");
    println!();
    Ok(())
}

async fn interactive(assistant: &DocumentAssistant) -> Result<(), Box<dyn std::error::Error>> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if EXIT_WORDS.contains(&question.to_lowercase().as_str()) {
            break;
        }

        eprint!("  ...");
        let turn = assistant.ask(question).await;
        eprint!("\r     \r");
        print_turn(&turn);
    }
    Ok(())
}

fn print_turn(turn: &AgentTurn) {
    println!();
    for record in &turn.tool_calls {
        let mark = if record.success { "✓" } else { "✗" };
        println!("  [{mark} {}] {}", record.tool_name, record.args);
    }
    for line in turn.reply().lines() {
        println!("  Assistant > {line}");
    }
    println!();
}
