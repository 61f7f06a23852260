//! Per-tenant chat settings, as delivered by the external settings store.
//!
//! The pipeline never persists these; it consumes a settings object per
//! request (deserialized from the caller, or assembled from the
//! environment for the CLI) and derives provider configs from it.

use ai_llm_service::config::defaults;
use ai_llm_service::{LlmClientRegistry, LlmModelConfig, LlmProvider};
use serde::Deserialize;
use std::sync::Arc;

use rag_store::{EmbeddingsProvider, OllamaEmbedder, OpenAiEmbedder};

/// Default canned reply when no relevant context exists.
pub const DEFAULT_NO_RESPONSE_TEXT: &str = "I'm here to help! However, I couldn't find specific \
    information about that in the provided content. Could you please rephrase your question or \
    provide more details? If you're looking for something specific, try asking about features, \
    functionality, or processes that might be documented in the system.";

/// Default canned greeting reply.
pub const DEFAULT_GREETING_MESSAGE: &str = "Hi! How may I help you today? I can answer questions \
    about your products and services based on the information you've provided.";

/// Settings consumed by the pipeline for one request.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Backend answering the question.
    pub llm_provider: LlmProvider,
    /// Backend embedding queries and chunks.
    pub embedding_provider: LlmProvider,
    /// API key for the OpenAI backend.
    pub openai_api_key: Option<String>,
    /// Base URL of the local Ollama server. A missing scheme is assumed
    /// `http://`.
    pub ollama_api_url: String,
    /// Ollama chat model.
    pub ollama_model: String,
    /// Ollama embedding model.
    pub ollama_embedding_model: String,
    /// Overrides the default instruction template entirely. Context and
    /// question insertion still happens.
    pub custom_prompt: Option<String>,
    /// Returned verbatim when no relevant context exists.
    pub no_response_text: String,
    /// Returned verbatim for bare greetings.
    pub greeting_message: String,
    /// Request timeout for provider calls, seconds.
    pub timeout_secs: Option<u64>,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            llm_provider: LlmProvider::Ollama,
            embedding_provider: LlmProvider::Ollama,
            openai_api_key: None,
            ollama_api_url: defaults::OLLAMA_API_BASE.to_string(),
            ollama_model: defaults::OLLAMA_CHAT_MODEL.to_string(),
            ollama_embedding_model: defaults::OLLAMA_EMBEDDING_MODEL.to_string(),
            custom_prompt: None,
            no_response_text: DEFAULT_NO_RESPONSE_TEXT.to_string(),
            greeting_message: DEFAULT_GREETING_MESSAGE.to_string(),
            timeout_secs: None,
        }
    }
}

impl ChatSettings {
    /// Build settings from environment variables with defaults.
    ///
    /// Environment variables used: `LLM_PROVIDER`, `EMBEDDING_PROVIDER`,
    /// `OPENAI_API_KEY`, `OLLAMA_API_URL`, `OLLAMA_MODEL`,
    /// `OLLAMA_EMBEDDING_MODEL`, `CUSTOM_PROMPT`, `NO_RESPONSE_TEXT`,
    /// `GREETING_MESSAGE`, `LLM_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Ok(v) = std::env::var("LLM_PROVIDER") {
            if let Ok(p) = LlmProvider::parse(&v) {
                s.llm_provider = p;
            }
        }
        if let Ok(v) = std::env::var("EMBEDDING_PROVIDER") {
            if let Ok(p) = LlmProvider::parse(&v) {
                s.embedding_provider = p;
            }
        }
        s.openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty());
        if let Ok(v) = std::env::var("OLLAMA_API_URL") {
            if !v.trim().is_empty() {
                s.ollama_api_url = v;
            }
        }
        if let Ok(v) = std::env::var("OLLAMA_MODEL") {
            if !v.trim().is_empty() {
                s.ollama_model = v;
            }
        }
        if let Ok(v) = std::env::var("OLLAMA_EMBEDDING_MODEL") {
            if !v.trim().is_empty() {
                s.ollama_embedding_model = v;
            }
        }
        s.custom_prompt = std::env::var("CUSTOM_PROMPT").ok().filter(|v| !v.is_empty());
        if let Ok(v) = std::env::var("NO_RESPONSE_TEXT") {
            if !v.trim().is_empty() {
                s.no_response_text = v;
            }
        }
        if let Ok(v) = std::env::var("GREETING_MESSAGE") {
            if !v.trim().is_empty() {
                s.greeting_message = v;
            }
        }
        s.timeout_secs = std::env::var("LLM_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok());
        s
    }

    /// Chat config for the configured answer backend (deterministic
    /// decoding).
    pub fn chat_config(&self) -> LlmModelConfig {
        match self.llm_provider {
            LlmProvider::OpenAi => {
                defaults::openai_chat(self.openai_api_key.clone(), self.timeout_secs)
            }
            LlmProvider::Ollama => defaults::ollama_chat(
                &self.ollama_api_url,
                &self.ollama_model,
                self.timeout_secs,
            ),
        }
    }

    /// Embedding config for the configured embedding backend.
    pub fn embedding_config(&self) -> LlmModelConfig {
        match self.embedding_provider {
            LlmProvider::OpenAi => {
                defaults::openai_embedding(self.openai_api_key.clone(), self.timeout_secs)
            }
            LlmProvider::Ollama => defaults::ollama_embedding(
                &self.ollama_api_url,
                &self.ollama_embedding_model,
                self.timeout_secs,
            ),
        }
    }

    /// Embedding provider adapter for the configured embedding backend.
    pub fn embedder(&self, svc: Arc<LlmClientRegistry>) -> Box<dyn EmbeddingsProvider> {
        match self.embedding_provider {
            LlmProvider::OpenAi => Box::new(OpenAiEmbedder::new(
                svc,
                self.openai_api_key.clone(),
                self.timeout_secs,
            )),
            LlmProvider::Ollama => Box::new(OllamaEmbedder::new(
                svc,
                &self.ollama_api_url,
                &self.ollama_embedding_model,
                self.timeout_secs,
            )),
        }
    }

    /// Expected embedding dimension for the configured embedding backend.
    /// Pure lookup, no network call.
    pub fn embedding_dimension(&self) -> usize {
        defaults::embedding_dimension(self.embedding_provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_ollama() {
        let s = ChatSettings::default();
        assert_eq!(s.llm_provider, LlmProvider::Ollama);
        assert_eq!(s.embedding_provider, LlmProvider::Ollama);
        assert_eq!(s.ollama_api_url, "http://127.0.0.1:11434");
        assert_eq!(s.embedding_dimension(), 768);
    }

    #[test]
    fn deserializes_partial_settings_objects() {
        let s: ChatSettings = serde_json::from_str(
            r#"{
                "llm_provider": "openai",
                "openai_api_key": "sk-test",
                "no_response_text": "Nothing found."
            }"#,
        )
        .unwrap();
        assert_eq!(s.llm_provider, LlmProvider::OpenAi);
        assert_eq!(s.embedding_provider, LlmProvider::Ollama);
        assert_eq!(s.no_response_text, "Nothing found.");
        assert_eq!(s.greeting_message, DEFAULT_GREETING_MESSAGE);
    }

    #[test]
    fn openai_dimension_is_1536() {
        let s = ChatSettings {
            embedding_provider: LlmProvider::OpenAi,
            ..ChatSettings::default()
        };
        assert_eq!(s.embedding_dimension(), 1536);
    }

    #[test]
    fn chat_config_pins_temperature_to_zero() {
        let s = ChatSettings::default();
        assert_eq!(s.chat_config().temperature, Some(0.0));
    }
}
