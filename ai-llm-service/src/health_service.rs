//! Connectivity probes for the configured providers.
//!
//! - Ollama: `GET {endpoint}/api/tags` (best-effort model existence check)
//! - OpenAI: `GET {endpoint}/v1/models` with Bearer auth
//!
//! [`HealthService::check`] is resilient and never fails: every error is
//! mapped to `ok = false` with a short message, which is what a
//! "test connection" caller wants to render.

use std::time::{Duration, Instant};

use reqwest::header;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::llm_model_config::LlmModelConfig;
use crate::config::llm_provider::LlmProvider;
use crate::error_handler::{AiLlmError, ProviderError, ProviderErrorKind, make_snippet};

/// A serializable health snapshot for a single provider config.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub provider: String,
    pub endpoint: String,
    pub model: Option<String>,
    pub ok: bool,
    pub latency_ms: u128,
    pub message: String,
}

/// Health checker reusing a single HTTP client across probes.
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a new health service with an optional client timeout (seconds).
    ///
    /// # Errors
    /// Returns [`AiLlmError::HttpTransport`] if the HTTP client cannot be built.
    pub fn new(timeout_secs: Option<u64>) -> Result<Self, AiLlmError> {
        let timeout = Duration::from_secs(timeout_secs.unwrap_or(10));
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Probes a single config, routing to the provider-specific check.
    /// Never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        let start = Instant::now();
        let result = match cfg.provider {
            LlmProvider::Ollama => self.try_probe_ollama(cfg).await,
            LlmProvider::OpenAi => self.try_probe_openai(cfg).await,
        };

        let latency_ms = start.elapsed().as_millis();
        match result {
            Ok(message) => HealthStatus {
                provider: cfg.provider.to_string(),
                endpoint: cfg.base_url(),
                model: Some(cfg.model.clone()),
                ok: true,
                latency_ms,
                message,
            },
            Err(err) => {
                warn!(provider = %cfg.provider, error = %err, "health probe failed");
                HealthStatus {
                    provider: cfg.provider.to_string(),
                    endpoint: cfg.base_url(),
                    model: Some(cfg.model.clone()),
                    ok: false,
                    latency_ms,
                    message: err.to_string(),
                }
            }
        }
    }

    /// Probes every supplied config. Never returns an error.
    pub async fn check_many(&self, configs: &[LlmModelConfig]) -> Vec<HealthStatus> {
        let mut out = Vec::with_capacity(configs.len());
        for cfg in configs {
            out.push(self.check(cfg).await);
        }
        out
    }

    async fn try_probe_ollama(&self, cfg: &LlmModelConfig) -> Result<String, AiLlmError> {
        let url = format!("{}/api/tags", cfg.base_url());
        debug!("GET {url}");

        let resp = self.client.get(&url).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                AiLlmError::from(ProviderError::new(
                    LlmProvider::Ollama,
                    ProviderErrorKind::Unreachable {
                        url: url.clone(),
                        hint: "ensure Ollama is running (`ollama serve`) and the URL is correct"
                            .to_string(),
                    },
                ))
            } else {
                AiLlmError::HttpTransport(e)
            }
        })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::HttpStatus {
                    status,
                    url,
                    snippet,
                },
            )
            .into());
        }

        #[derive(serde::Deserialize)]
        struct Tag {
            name: String,
        }
        #[derive(serde::Deserialize)]
        struct Tags {
            models: Option<Vec<Tag>>,
        }

        match resp.json::<Tags>().await {
            Ok(Tags {
                models: Some(models),
            }) if models.iter().any(|m| m.name == cfg.model) => {
                Ok("Ollama is healthy; model is available".to_string())
            }
            Ok(Tags { models: Some(_) }) => Ok(format!(
                "Ollama is up, but model '{}' was not found in /api/tags",
                cfg.model
            )),
            _ => Ok("Ollama is reachable".to_string()),
        }
    }

    async fn try_probe_openai(&self, cfg: &LlmModelConfig) -> Result<String, AiLlmError> {
        let url = format!("{}/v1/models", cfg.base_url());
        let api_key = cfg.api_key.as_ref().ok_or_else(|| {
            ProviderError::new(LlmProvider::OpenAi, ProviderErrorKind::MissingApiKey)
        })?;

        let auth = header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
            ProviderError::new(
                LlmProvider::OpenAi,
                ProviderErrorKind::Decode(format!("invalid API key header: {e}")),
            )
        })?;

        debug!("GET {url}");
        let resp = self
            .client
            .get(&url)
            .header(header::AUTHORIZATION, auth)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let snippet = make_snippet(&resp.text().await.unwrap_or_default());
            return Err(ProviderError::new(
                LlmProvider::OpenAi,
                ProviderErrorKind::HttpStatus {
                    status,
                    url,
                    snippet,
                },
            )
            .into());
        }

        Ok("OpenAI is healthy".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn ollama_probe_reports_available_model() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/tags"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "models": [{"name": "nomic-embed-text"}]
            })))
            .mount(&server)
            .await;

        let svc = HealthService::new(Some(5)).unwrap();
        let cfg = defaults::ollama_embedding(&server.uri(), "nomic-embed-text", Some(5));
        let status = svc.check(&cfg).await;
        assert!(status.ok);
        assert!(status.message.contains("model is available"));
    }

    #[tokio::test]
    async fn unreachable_ollama_reports_failure_not_panic() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = defaults::ollama_embedding("http://127.0.0.1:1", "nomic-embed-text", Some(1));
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert!(status.message.contains("cannot reach"));
    }

    #[tokio::test]
    async fn openai_probe_without_key_fails_cleanly() {
        let svc = HealthService::new(Some(1)).unwrap();
        let cfg = defaults::openai_chat(None, Some(1));
        let status = svc.check(&cfg).await;
        assert!(!status.ok);
        assert!(status.message.contains("API key is not set"));
    }
}
