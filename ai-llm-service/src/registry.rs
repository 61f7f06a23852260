//! Config-keyed registry of provider clients.
//!
//! Construct once, wrap in `Arc`, and pass clones to dependents. Every call
//! carries its own [`LlmModelConfig`]; the registry caches the underlying
//! HTTP clients per distinct configuration (endpoint + model + key +
//! timeout), so two tenants with different credentials never share a client.

use std::{
    collections::HashMap,
    hash::{Hash, Hasher},
    sync::Arc,
};

use tokio::sync::RwLock;

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::AiLlmError,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};

/// Shared registry dispatching chat and embedding calls to the provider
/// named in the supplied config.
#[derive(Default)]
pub struct LlmClientRegistry {
    ollama: RwLock<HashMap<ClientKey, Arc<OllamaService>>>,
    openai: RwLock<HashMap<ClientKey, Arc<OpenAiService>>>,
}

impl LlmClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a non-streaming chat completion against the config's provider.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] from client construction or the provider call.
    pub async fn chat(
        &self,
        cfg: &LlmModelConfig,
        system: Option<&str>,
        user: &str,
    ) -> Result<String, AiLlmError> {
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                cli.chat(system, user).await
            }
            LlmProvider::OpenAi => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.chat(system, user).await
            }
        }
    }

    /// Computes an embedding vector for a single input.
    ///
    /// # Errors
    /// Returns [`AiLlmError`] from client construction or the provider call.
    pub async fn embed(&self, cfg: &LlmModelConfig, input: &str) -> Result<Vec<f32>, AiLlmError> {
        match cfg.provider {
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                cli.embed(input).await
            }
            LlmProvider::OpenAi => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.embeddings(input).await
            }
        }
    }

    /// Computes embeddings for a batch of inputs, order-preserving.
    ///
    /// OpenAI accepts the whole batch in one request; Ollama is called once
    /// per input (callers wanting concurrency fan out over [`Self::embed`]).
    pub async fn embed_batch(
        &self,
        cfg: &LlmModelConfig,
        inputs: &[String],
    ) -> Result<Vec<Vec<f32>>, AiLlmError> {
        match cfg.provider {
            LlmProvider::OpenAi => {
                let cli = self.get_or_init_openai(cfg).await?;
                cli.embeddings_batch(inputs).await
            }
            LlmProvider::Ollama => {
                let cli = self.get_or_init_ollama(cfg).await?;
                let mut out = Vec::with_capacity(inputs.len());
                for input in inputs {
                    out.push(cli.embed(input).await?);
                }
                Ok(out)
            }
        }
    }

    /* --------------------- Internals --------------------- */

    async fn get_or_init_ollama(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OllamaService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.ollama.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OllamaService::new(cfg.clone())?);
        let mut w = self.ollama.write().await;
        Ok(w.entry(key).or_insert(cli).clone())
    }

    async fn get_or_init_openai(
        &self,
        cfg: &LlmModelConfig,
    ) -> Result<Arc<OpenAiService>, AiLlmError> {
        let key = ClientKey::from(cfg);
        if let Some(cli) = self.openai.read().await.get(&key).cloned() {
            return Ok(cli);
        }
        let cli = Arc::new(OpenAiService::new(cfg.clone())?);
        let mut w = self.openai.write().await;
        Ok(w.entry(key).or_insert(cli).clone())
    }
}

/// Internal cache key identifying a unique client config.
#[derive(Clone, PartialEq, Eq)]
struct ClientKey {
    provider: LlmProvider,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout: Option<u64>,
}

impl From<&LlmModelConfig> for ClientKey {
    fn from(cfg: &LlmModelConfig) -> Self {
        Self {
            provider: cfg.provider,
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone(),
            timeout: cfg.timeout_secs,
        }
    }
}

impl Hash for ClientKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.provider.hash(state);
        self.endpoint.hash(state);
        self.model.hash(state);
        self.api_key.hash(state);
        self.timeout.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;

    #[tokio::test]
    async fn same_config_reuses_the_client() {
        let registry = LlmClientRegistry::new();
        let cfg = defaults::ollama_embedding("http://127.0.0.1:11434", "nomic-embed-text", None);

        let a = registry.get_or_init_ollama(&cfg).await.unwrap();
        let b = registry.get_or_init_ollama(&cfg).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn different_configs_get_distinct_clients() {
        let registry = LlmClientRegistry::new();
        let a_cfg = defaults::ollama_embedding("http://127.0.0.1:11434", "nomic-embed-text", None);
        let b_cfg = defaults::ollama_embedding("http://10.0.0.2:11434", "nomic-embed-text", None);

        let a = registry.get_or_init_ollama(&a_cfg).await.unwrap();
        let b = registry.get_or_init_ollama(&b_cfg).await.unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn missing_key_surfaces_from_openai_path() {
        let registry = LlmClientRegistry::new();
        let cfg = defaults::openai_chat(None, None);
        let err = registry.chat(&cfg, None, "hello").await.unwrap_err();
        assert!(err.is_missing_api_key());
    }
}
