//! OpenAI embedding provider implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ai_llm_service::LlmClientRegistry;
use ai_llm_service::config::defaults;

use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;

/// Remote OpenAI embedding provider.
///
/// Uses the fixed `text-embedding-3-small` model with a pinned 1536-dim
/// output. Batch embedding is a single multi-input request; the service
/// layer restores input order from the per-item indices.
pub struct OpenAiEmbedder {
    svc: Arc<LlmClientRegistry>,
    cfg: ai_llm_service::LlmModelConfig,
    dim: usize,
}

impl OpenAiEmbedder {
    /// Construct an embedder carrying the caller's API key. A missing key
    /// surfaces as a credentials error on the first call, not here.
    pub fn new(
        svc: Arc<LlmClientRegistry>,
        api_key: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            svc,
            cfg: defaults::openai_embedding(api_key, timeout_secs),
            dim: defaults::OPENAI_EMBEDDING_DIMENSION,
        }
    }
}

impl EmbeddingsProvider for OpenAiEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            let v = self.svc.embed(&self.cfg, text).await?;
            if v.len() != self.dim {
                return Err(RagError::VectorSizeMismatch {
                    got: v.len(),
                    want: self.dim,
                });
            }
            Ok(v)
        })
    }

    fn embed_many<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            let vectors = self.svc.embed_batch(&self.cfg, texts).await?;
            for v in &vectors {
                if v.len() != self.dim {
                    return Err(RagError::VectorSizeMismatch {
                        got: v.len(),
                        want: self.dim,
                    });
                }
            }
            Ok(vectors)
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}
