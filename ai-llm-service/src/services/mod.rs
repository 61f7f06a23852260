//! Thin provider clients. One implementation per backend; dispatch happens in
//! [`crate::registry::LlmClientRegistry`].

pub mod ollama_service;
pub mod open_ai_service;
