//! Unified error handling for `ai-llm-service`.
//!
//! One top-level error type [`AiLlmError`] for the whole crate, with
//! domain-specific errors grouped in nested types. Provider failures carry a
//! human-actionable message; nothing here retries — retry policy belongs to
//! callers.

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::llm_provider::LlmProvider;

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/// Top-level error for the `ai-llm-service` crate.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Provider-level failures (auth, status, shape, reachability).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),
}

/// Error enum for config-time validation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Unsupported provider name in a settings object.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/// A provider failure with the backend it came from attached.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    /// Which backend failed.
    pub provider: LlmProvider,
    /// What went wrong.
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: LlmProvider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

/// Classified provider failures.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ProviderErrorKind {
    /// The config names a different provider than this client handles.
    #[error("invalid provider for this client")]
    InvalidProvider,

    /// The backend requires an API key and none was configured.
    #[error("API key is not set")]
    MissingApiKey,

    /// The backend could not be reached at all. `hint` tells the operator
    /// what to check.
    #[error("cannot reach {url}: {hint}")]
    Unreachable { url: String, hint: String },

    /// Upstream returned a non-successful HTTP status.
    #[error("unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        status: StatusCode,
        url: String,
        snippet: String,
    },

    /// Response payload could not be decoded as expected.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// Chat completion came back without any choices/content.
    #[error("empty completion response")]
    EmptyChoices,
}

impl AiLlmError {
    /// True when the failure is the missing-credentials case.
    pub fn is_missing_api_key(&self) -> bool {
        matches!(
            self,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::MissingApiKey,
                ..
            })
        )
    }
}

/// Trim a response body down to a log-friendly snippet.
pub fn make_snippet(text: &str) -> String {
    text.chars().take(240).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_backend_and_kind() {
        let err = ProviderError::new(LlmProvider::OpenAi, ProviderErrorKind::MissingApiKey);
        let msg = err.to_string();
        assert!(msg.contains("openai"));
        assert!(msg.contains("API key is not set"));
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(10_000);
        assert_eq!(make_snippet(&long).len(), 240);
    }
}
