//! Shared LLM service: provider clients (Ollama/OpenAI) for chat completion
//! and embeddings, unified errors, health checks, and a config-keyed client
//! registry.
//!
//! The crate deliberately has no global client state: callers hand a
//! [`LlmModelConfig`] to every operation, and [`LlmClientRegistry`] caches the
//! underlying HTTP clients per distinct configuration.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod registry;
pub mod services;

pub use config::llm_model_config::{LlmModelConfig, normalize_base_url};
pub use config::llm_provider::LlmProvider;
pub use error_handler::{AiLlmError, ProviderError, ProviderErrorKind};
pub use health_service::{HealthService, HealthStatus};
pub use registry::LlmClientRegistry;
