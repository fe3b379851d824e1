//! Scripted oracles for tool tests.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use docrouter_core::error::ProviderError;
use docrouter_core::message::Message;
use docrouter_core::provider::{Provider, ProviderRequest, ProviderResponse};
use docrouter_core::settings::Settings;
use docrouter_providers::HashEmbedder;

enum Mode {
    Reply(String),
    Fail,
    /// Reply with "summary of N" where N counts the numbered context entries.
    CountParts,
}

/// Records every prompt and tracks how many calls are in flight at once.
pub struct RecordingProvider {
    mode: Mode,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl RecordingProvider {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::with_mode(Mode::Reply(text.into()))
    }

    pub fn failing() -> Self {
        Self::with_mode(Mode::Fail)
    }

    pub fn counting_parts() -> Self {
        Self::with_mode(Mode::CountParts)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for RecordingProvider {
    fn name(&self) -> &str {
        "recording"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let content = match &self.mode {
            Mode::Reply(text) => text.clone(),
            Mode::Fail => return Err(ProviderError::Network("connection reset".into())),
            Mode::CountParts => {
                let parts = (1..)
                    .take_while(|i| prompt.contains(&format!("[{i}] ")))
                    .count();
                format!("summary of {parts}")
            }
        };

        Ok(ProviderResponse {
            message: Message::assistant(content),
            usage: None,
            model: request.model,
        })
    }
}

pub fn settings_with(provider: Arc<RecordingProvider>) -> Settings {
    Settings::new(provider, Arc::new(HashEmbedder::new(128)), "test-model")
}
