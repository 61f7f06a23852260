//! Lightweight Ollama service for chat completion and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/chat`  — non-streaming chat completion (`stream=false`)
//! - `POST {endpoint}/api/embed` — embeddings retrieval
//!
//! The embed endpoint has shipped two response shapes over Ollama versions
//! (a top-level `embedding` array, or an `embeddings` array of arrays); the
//! parse step tolerates both and fails with a decode error when neither is
//! present or the vector is empty. A connection failure is reported as a
//! distinct unreachable error carrying remediation hints.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::defaults;
use crate::config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
use crate::error_handler::{AiLlmError, ProviderError, ProviderErrorKind, make_snippet};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with a
/// configurable timeout. Never retries internally.
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_chat: String,
    url_embed: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// The endpoint is normalized: a base URL without a scheme is assumed to
    /// be `http://`.
    ///
    /// # Errors
    /// - `ProviderErrorKind::InvalidProvider` if `cfg.provider` is not Ollama
    /// - [`AiLlmError::HttpTransport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(cfg.provider, ProviderErrorKind::InvalidProvider).into(),
            );
        }
        if cfg.model.trim().is_empty() {
            return Err(crate::error_handler::ConfigError::EmptyModel.into());
        }

        let timeout = Duration::from_secs(cfg.timeout_secs.unwrap_or(defaults::DEFAULT_TIMEOUT_SECS));
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let base = cfg.base_url();
        let url_chat = format!("{}/api/chat", base);
        let url_embed = format!("{}/api/embed", base);

        Ok(Self {
            client,
            cfg,
            url_chat,
            url_embed,
        })
    }

    /// Performs a non-streaming chat request via `/api/chat`.
    ///
    /// # Errors
    /// - `ProviderErrorKind::Unreachable` if the server cannot be reached
    /// - `ProviderErrorKind::HttpStatus` for non-2xx responses
    /// - `ProviderErrorKind::Decode` if `message.content` is absent — a
    ///   malformed reply is never silently treated as an empty answer
    pub async fn chat(&self, system: Option<&str>, user: &str) -> Result<String, AiLlmError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = system {
            messages.push(ChatMessage {
                role: "system",
                content: sys,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: user,
        });

        let body = ChatRequest {
            model: &self.cfg.model,
            messages,
            stream: false,
            options: ChatOptions {
                temperature: self.cfg.temperature,
            },
        };

        debug!(model = %self.cfg.model, "POST {}", self.url_chat);

        let resp = self
            .client
            .post(&self.url_chat)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(&self.url_chat, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_chat.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(%status, %url, %snippet, "Ollama /api/chat returned non-success status");

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

        let out: ChatResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; ensure `stream=false` is used"
                )),
            )
        })?;

        out.message.and_then(|m| m.content).ok_or_else(|| {
            ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode("missing `message.content` in chat response".into()),
            )
            .into()
        })
    }

    /// Retrieves an embedding vector via `/api/embed`.
    ///
    /// # Errors
    /// - `ProviderErrorKind::Unreachable` if the server cannot be reached
    /// - `ProviderErrorKind::HttpStatus` for non-2xx responses
    /// - `ProviderErrorKind::Decode` if neither known response shape is
    ///   present or the returned vector is empty
    pub async fn embed(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let body = EmbedRequest {
            model: &self.cfg.model,
            input,
        };

        debug!(model = %self.cfg.model, input_len = input.len(), "POST {}", self.url_embed);

        let resp = self
            .client
            .post(&self.url_embed)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(&self.url_embed, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embed.clone();
            let text = resp.text().await.unwrap_or_default();
            let snippet = make_snippet(&text);

            error!(%status, %url, %snippet, "Ollama /api/embed returned non-success status");

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

        let out: EmbedResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `embedding` or `embeddings`"
                )),
            )
        })?;

        let vector = out
            .embeddings
            .and_then(|mut batches| {
                if batches.is_empty() {
                    None
                } else {
                    Some(batches.remove(0))
                }
            })
            .or(out.embedding);

        match vector {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "empty embedding; make sure model '{}' is pulled (`ollama pull {}`) and supports embeddings",
                    self.cfg.model, self.cfg.model
                )),
            )
            .into()),
        }
    }

    /// Maps a transport failure to the actionable unreachable error when the
    /// server could not be contacted at all.
    fn map_send_error(&self, url: &str, e: reqwest::Error) -> AiLlmError {
        if e.is_connect() || e.is_timeout() {
            ProviderError::new(
                LlmProvider::Ollama,
                ProviderErrorKind::Unreachable {
                    url: url.to_string(),
                    hint: "ensure Ollama is running (`ollama serve`), the base URL is correct, \
                           and the model is pulled"
                        .to_string(),
                },
            )
            .into()
        } else {
            AiLlmError::HttpTransport(e)
        }
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/chat` (non-streaming).
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Default, Serialize)]
struct ChatOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// Response body for `/api/chat`. The assistant text is in `message.content`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatMessageOut>,
}

#[derive(Debug, Deserialize)]
struct ChatMessageOut {
    content: Option<String>,
}

/// Request body for `/api/embed`.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body for `/api/embed`, tolerating both known shapes.
#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider: LlmProvider::Ollama,
            model: defaults::OLLAMA_EMBEDDING_MODEL.to_string(),
            endpoint: endpoint.to_string(),
            api_key: None,
            temperature: Some(0.0),
            timeout_secs: Some(5),
        }
    }

    #[tokio::test]
    async fn embed_accepts_flat_embedding_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        let v = svc.embed("hello").await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_accepts_nested_embeddings_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "embeddings": [[0.5, 0.6]]
            })))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        let v = svc.embed("hello").await.unwrap();
        assert_eq!(v, vec![0.5, 0.6]);
    }

    #[tokio::test]
    async fn embed_rejects_unknown_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"model": "x"})))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        let err = svc.embed("hello").await.unwrap_err();
        assert!(matches!(
            err,
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::Decode(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn embed_rejects_empty_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"embedding": []})))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        let err = svc.embed("hello").await.unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("ollama pull"), "hint missing from: {msg}");
    }

    #[tokio::test]
    async fn chat_without_message_content_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"done": true})))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        let err = svc.chat(None, "hello").await.unwrap_err();
        assert!(err.to_string().contains("message.content"));
    }

    #[tokio::test]
    async fn chat_returns_message_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "message": {"role": "assistant", "content": "Returns are accepted within 30 days."}
            })))
            .mount(&server)
            .await;

        let svc = OllamaService::new(cfg(&server.uri())).unwrap();
        let out = svc.chat(Some("be terse"), "what is the return policy?").await.unwrap();
        assert_eq!(out, "Returns are accepted within 30 days.");
    }

    #[tokio::test]
    async fn connection_refused_maps_to_unreachable_with_hint() {
        // Nothing listens on port 1.
        let svc = OllamaService::new(cfg("http://127.0.0.1:1")).unwrap();
        let err = svc.embed("hello").await.unwrap_err();
        match err {
            AiLlmError::Provider(ProviderError {
                kind: ProviderErrorKind::Unreachable { hint, .. },
                ..
            }) => assert!(hint.contains("ollama serve")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn endpoint_without_scheme_is_normalized() {
        let svc = OllamaService::new(cfg("localhost:11434")).unwrap();
        assert_eq!(svc.url_chat, "http://localhost:11434/api/chat");
    }
}
