//! Ollama embedding provider implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use ai_llm_service::LlmClientRegistry;
use ai_llm_service::config::defaults;

use crate::embed::EmbeddingsProvider;
use crate::embed_pool;
use crate::errors::RagError;

/// Default number of concurrent embedding requests against Ollama.
const DEFAULT_CONCURRENCY: usize = 4;

/// Local Ollama embedding provider.
///
/// Batch embedding fans out one request per text with bounded concurrency;
/// output order always matches input order.
pub struct OllamaEmbedder {
    svc: Arc<LlmClientRegistry>,
    cfg: ai_llm_service::LlmModelConfig,
    dim: usize,
    concurrency: usize,
}

impl OllamaEmbedder {
    /// Construct an embedder against the given base URL and model.
    pub fn new(
        svc: Arc<LlmClientRegistry>,
        base_url: &str,
        model: &str,
        timeout_secs: Option<u64>,
    ) -> Self {
        Self {
            svc,
            cfg: defaults::ollama_embedding(base_url, model, timeout_secs),
            dim: defaults::OLLAMA_EMBEDDING_DIMENSION,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Overrides the fan-out width for batch embedding.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

impl EmbeddingsProvider for OllamaEmbedder {
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
        Box::pin(embed_pool::embed_ordered(self, texts, self.concurrency))
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

