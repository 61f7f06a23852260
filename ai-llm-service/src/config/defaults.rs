//! Fixed provider constants and convenience config constructors.
//!
//! The model/dimension pairs are part of the pipeline contract: every stored
//! vector must match the dimension of the provider that produced it, so these
//! values are pinned here rather than configured ad hoc.

use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};

/// OpenAI chat model used for grounded answer generation.
pub const OPENAI_CHAT_MODEL: &str = "gpt-4o-mini";
/// OpenAI embedding model (fixed output dimension).
pub const OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Output dimension requested from the OpenAI embedding endpoint.
pub const OPENAI_EMBEDDING_DIMENSION: usize = 1536;
/// Default OpenAI API base.
pub const OPENAI_API_BASE: &str = "https://api.openai.com";

/// Default Ollama endpoint.
pub const OLLAMA_API_BASE: &str = "http://127.0.0.1:11434";
/// Default Ollama chat model.
pub const OLLAMA_CHAT_MODEL: &str = "llama3.2:3b-instruct-q4_K_M";
/// Ollama embedding model.
pub const OLLAMA_EMBEDDING_MODEL: &str = "nomic-embed-text";
/// Output dimension of [`OLLAMA_EMBEDDING_MODEL`].
pub const OLLAMA_EMBEDDING_DIMENSION: usize = 768;

/// Default request timeout, seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Embedding dimension for a provider. Pure lookup, no network call.
pub fn embedding_dimension(provider: LlmProvider) -> usize {
    match provider {
        LlmProvider::OpenAi => OPENAI_EMBEDDING_DIMENSION,
        LlmProvider::Ollama => OLLAMA_EMBEDDING_DIMENSION,
    }
}

/// Chat config for OpenAI with deterministic decoding.
pub fn openai_chat(api_key: Option<String>, timeout_secs: Option<u64>) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::OpenAi,
        model: OPENAI_CHAT_MODEL.to_string(),
        endpoint: OPENAI_API_BASE.to_string(),
        api_key,
        temperature: Some(0.0),
        timeout_secs: Some(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    }
}

/// Embedding config for OpenAI.
pub fn openai_embedding(api_key: Option<String>, timeout_secs: Option<u64>) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::OpenAi,
        model: OPENAI_EMBEDDING_MODEL.to_string(),
        endpoint: OPENAI_API_BASE.to_string(),
        api_key,
        temperature: None,
        timeout_secs: Some(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    }
}

/// Chat config for a local Ollama server with deterministic decoding.
pub fn ollama_chat(base_url: &str, model: &str, timeout_secs: Option<u64>) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: model.to_string(),
        endpoint: base_url.to_string(),
        api_key: None,
        temperature: Some(0.0),
        timeout_secs: Some(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    }
}

/// Embedding config for a local Ollama server.
pub fn ollama_embedding(base_url: &str, model: &str, timeout_secs: Option<u64>) -> LlmModelConfig {
    LlmModelConfig {
        provider: LlmProvider::Ollama,
        model: model.to_string(),
        endpoint: base_url.to_string(),
        api_key: None,
        temperature: None,
        timeout_secs: Some(timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
    }
}
