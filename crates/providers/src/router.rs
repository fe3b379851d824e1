//! Provider router: selects the reasoning and embedding oracles from config.

use std::collections::HashMap;
use std::sync::Arc;

use docrouter_config::AppConfig;
use docrouter_core::embedding::Embedder;
use docrouter_core::provider::Provider;
use docrouter_core::settings::Settings;
use tracing::debug;

use crate::embedder::{HashEmbedder, ProviderEmbedder};
use crate::openai_compat::OpenAiCompatProvider;

/// Routes LLM requests to the correct provider.
pub struct ProviderRouter {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRouter {
    /// Create a new router with a default provider.
    pub fn new(default_provider: impl Into<String>) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider.into(),
        }
    }

    /// Register a provider.
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn Provider>) {
        self.providers.insert(name.into(), provider);
    }

    /// Get the default provider.
    pub fn default(&self) -> Option<Arc<dyn Provider>> {
        self.providers.get(&self.default_provider).cloned()
    }

    /// Get a specific provider by name.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Provider>> {
        self.providers.get(name).cloned()
    }

    /// List all registered provider names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.providers.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> ProviderRouter {
    let mut router = ProviderRouter::new(&config.default_provider);

    for (name, provider_config) in &config.providers {
        let api_key = config.api_key_for(name).unwrap_or_default();
        let base_url = provider_config
            .api_url
            .clone()
            .unwrap_or_else(|| default_base_url(name));

        router.register(
            name.clone(),
            Arc::new(OpenAiCompatProvider::new(name, &base_url, &api_key)),
        );
    }

    // Ensure the default provider exists (even if not explicitly configured)
    if router.get(&config.default_provider).is_none() {
        let api_key = config.api_key.clone().unwrap_or_default();
        let base_url = default_base_url(&config.default_provider);
        router.register(
            config.default_provider.clone(),
            Arc::new(OpenAiCompatProvider::new(
                &config.default_provider,
                &base_url,
                &api_key,
            )),
        );
    }

    router
}

/// Build the embedding oracle named by `[embedding] provider`.
///
/// "hash" is local; "openai" or any configured provider name goes through
/// that provider's `/embeddings` endpoint.
pub fn build_embedder(config: &AppConfig, router: &ProviderRouter) -> Arc<dyn Embedder> {
    let embedding = &config.embedding;

    if embedding.is_local() {
        debug!(dimensions = embedding.hash_dimensions, "Using offline hash embedder");
        return Arc::new(HashEmbedder::new(embedding.hash_dimensions));
    }

    let provider: Arc<dyn Provider> = match router.get(&embedding.provider) {
        Some(provider) => provider,
        None => Arc::new(OpenAiCompatProvider::new(
            &embedding.provider,
            default_base_url(&embedding.provider),
            config.api_key_for(&embedding.provider).unwrap_or_default(),
        )),
    };

    Arc::new(ProviderEmbedder::new(provider, &embedding.model).with_batch_size(embedding.batch_size))
}

/// Build the shared oracle settings for a whole session.
pub fn build_settings(config: &AppConfig) -> Settings {
    let router = build_from_config(config);
    let embedder = build_embedder(config, &router);
    let provider: Arc<dyn Provider> = match router.default() {
        Some(provider) => provider,
        None => Arc::new(OpenAiCompatProvider::new(
            &config.default_provider,
            default_base_url(&config.default_provider),
            config.api_key.clone().unwrap_or_default(),
        )),
    };

    let model = config
        .providers
        .get(&config.default_provider)
        .and_then(|p| p.default_model.clone())
        .unwrap_or_else(|| config.default_model.clone());

    Settings::new(provider, embedder, model)
        .with_temperature(config.default_temperature)
        .with_max_tokens(config.default_max_tokens)
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "deepseek" => "https://api.deepseek.com/v1".into(),
        "groq" => "https://api.groq.com/openai/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1".into(),
        _ => format!("https://{provider_name}.api.example.com/v1"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrouter_config::ProviderConfig;

    #[test]
    fn router_register_and_lookup() {
        let mut router = ProviderRouter::new("openai");
        router.register("openai", Arc::new(OpenAiCompatProvider::openai("sk-test")));

        assert!(router.get("openai").is_some());
        assert!(router.get("nonexistent").is_none());
        assert!(router.default().is_some());
        assert_eq!(router.list(), vec!["openai"]);
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("openrouter").contains("openrouter.ai"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }

    #[test]
    fn build_from_default_config() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        assert!(router.default().is_some());
    }

    #[test]
    fn configured_providers_are_registered() {
        let mut config = AppConfig::default();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: Some("http://gpu-box:11434/v1".into()),
                default_model: Some("llama3".into()),
            },
        );
        let router = build_from_config(&config);
        assert_eq!(router.list(), vec!["ollama", "openai"]);
    }

    #[test]
    fn hash_embedding_needs_no_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "hash".into();
        config.embedding.hash_dimensions = 32;
        let router = build_from_config(&config);
        let embedder = build_embedder(&config, &router);
        assert_eq!(embedder.name(), "hash");
    }

    #[test]
    fn remote_embedder_is_named_after_provider_and_model() {
        let config = AppConfig::default();
        let router = build_from_config(&config);
        let embedder = build_embedder(&config, &router);
        assert_eq!(embedder.name(), "openai:text-embedding-3-small");
    }

    #[test]
    fn settings_use_provider_model_override() {
        let mut config = AppConfig {
            default_provider: "ollama".into(),
            ..AppConfig::default()
        };
        config.embedding.provider = "hash".into();
        config.providers.insert(
            "ollama".into(),
            ProviderConfig {
                api_key: None,
                api_url: None,
                default_model: Some("llama3".into()),
            },
        );
        let settings = build_settings(&config);
        assert_eq!(settings.model, "llama3");
        assert_eq!(settings.provider.name(), "ollama");
        assert_eq!(settings.max_tokens, Some(2048));
    }
}
