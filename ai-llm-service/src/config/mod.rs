//! Configuration types for provider clients.

pub mod defaults;
pub mod llm_model_config;
pub mod llm_provider;
