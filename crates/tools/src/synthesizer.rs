//! Response synthesis: turning retrieved text into an answer with one call
//! to the reasoning oracle.

use docrouter_core::error::ProviderError;
use docrouter_core::message::Message;
use docrouter_core::settings::Settings;
use tracing::debug;

const SEPARATOR: &str = "---------------------";

/// Asks the reasoning oracle to answer from supplied context only.
#[derive(Debug, Clone)]
pub struct Synthesizer {
    settings: Settings,
}

impl Synthesizer {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Answer `query` from retrieved segments.
    pub async fn answer(&self, query: &str, contexts: &[String]) -> Result<String, ProviderError> {
        let prompt = format!(
            "Context information is below.\n{SEPARATOR}\n{}\n{SEPARATOR}\n\
             Given the context information and not prior knowledge, answer the query.\n\
             Query: {query}\nAnswer: ",
            numbered(contexts)
        );
        self.ask(prompt).await
    }

    /// Merge several texts into one answer; used at every level of a
    /// summary tree.
    pub async fn summarize(&self, query: &str, texts: &[String]) -> Result<String, ProviderError> {
        let prompt = format!(
            "Context information from multiple sources is below.\n{SEPARATOR}\n{}\n{SEPARATOR}\n\
             Given the information from multiple sources and not prior knowledge, answer the query.\n\
             Query: {query}\nAnswer: ",
            numbered(texts)
        );
        self.ask(prompt).await
    }

    async fn ask(&self, prompt: String) -> Result<String, ProviderError> {
        let request = self.settings.request(vec![Message::user(prompt)], Vec::new());
        let response = self.settings.provider.complete(request).await?;

        let answer = response.message.content.trim();
        if answer.is_empty() {
            return Err(ProviderError::Malformed(
                "oracle returned an empty synthesis".into(),
            ));
        }

        debug!(
            model = %response.model,
            tokens = response.usage.as_ref().map(|u| u.total_tokens).unwrap_or(0),
            "Synthesized response"
        );
        Ok(answer.to_string())
    }
}

fn numbered(texts: &[String]) -> String {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| format!("[{}] {}", i + 1, text.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
