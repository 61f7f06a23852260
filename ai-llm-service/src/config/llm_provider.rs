use serde::{Deserialize, Serialize};

use crate::error_handler::{AiLlmError, ConfigError};

/// Represents the provider (backend) used for LLM inference and embeddings.
///
/// The same enum selects the backend for both chat completion and embedding
/// calls; dispatch happens at call time against the config carried in by the
/// caller, never through a shared mutable client object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// OpenAI's hosted API.
    OpenAi,
    /// Local Ollama runtime.
    Ollama,
}

impl LlmProvider {
    /// Parse a provider name as it appears in settings objects
    /// (`"openai"` / `"ollama"`, case-insensitive).
    pub fn parse(s: &str) -> Result<Self, AiLlmError> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(LlmProvider::OpenAi),
            "ollama" => Ok(LlmProvider::Ollama),
            other => Err(ConfigError::UnsupportedProvider(other.to_string()).into()),
        }
    }

    /// Stable lowercase name, matching the settings-store representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LlmProvider::OpenAi => "openai",
            LlmProvider::Ollama => "ollama",
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
