//! Shared model settings, passed explicitly to every component that talks
//! to an oracle.

use std::sync::Arc;

use crate::embedding::Embedder;
use crate::message::Message;
use crate::provider::{Provider, ProviderRequest, ToolDefinition};

/// The reasoning and embedding oracles plus the parameters used for every
/// completion request.
#[derive(Clone)]
pub struct Settings {
    pub provider: Arc<dyn Provider>,
    pub embedder: Arc<dyn Embedder>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Settings {
    pub fn new(
        provider: Arc<dyn Provider>,
        embedder: Arc<dyn Embedder>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            embedder,
            model: model.into(),
            temperature: 0.1,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Build a request using these settings.
    pub fn request(&self, messages: Vec<Message>, tools: Vec<ToolDefinition>) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools,
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider.name())
            .field("embedder", &self.embedder.name())
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}
