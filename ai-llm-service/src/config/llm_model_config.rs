use crate::config::llm_provider::LlmProvider;

/// Configuration for a single LLM or embedding invocation.
///
/// Carried by the caller on every request; there is no process-global
/// default. Two configs that compare equal share an HTTP client through
/// [`crate::registry::LlmClientRegistry`].
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The provider/backend (OpenAI or Ollama).
    pub provider: LlmProvider,

    /// Model identifier string (e.g., `"gpt-4o-mini"`, `"nomic-embed-text"`).
    pub model: String,

    /// Inference endpoint base URL. May be given without a scheme;
    /// [`normalize_base_url`] assumes `http://` in that case.
    pub endpoint: String,

    /// Optional API key for providers that require authentication.
    pub api_key: Option<String>,

    /// Sampling temperature. Grounded answer generation pins this to `0.0`.
    pub temperature: Option<f32>,

    /// Request timeout in seconds. Defaults to 30 when unset.
    pub timeout_secs: Option<u64>,
}

impl LlmModelConfig {
    /// Endpoint with a guaranteed scheme and no trailing slash.
    pub fn base_url(&self) -> String {
        normalize_base_url(&self.endpoint)
    }
}

/// Normalize a base URL: trim, assume `http://` when no scheme is present,
/// and drop any trailing slash.
pub fn normalize_base_url(raw: &str) -> String {
    let url = raw.trim();
    let url = if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("http://{url}")
    };
    url.trim_end_matches('/').to_string()
}
