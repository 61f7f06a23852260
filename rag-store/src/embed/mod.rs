//! Embedding provider abstraction.
//!
//! Two interchangeable backends sit behind one trait: a remote OpenAI
//! backend (fixed model, fixed 1536-dim output, requires an API key) and a
//! local Ollama backend (configurable base URL/model, 768-dim default).
//! Both are thin adapters over [`ai_llm_service::LlmClientRegistry`];
//! neither retries internally.

use std::{future::Future, pin::Pin};

use crate::errors::RagError;

pub mod ollama;
pub mod openai;

pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in another embedding backend. `embed_many`
/// must be order-preserving: output index `i` is the vector for input `i`,
/// regardless of completion order.
pub trait EmbeddingsProvider: Send + Sync {
    /// Embed a single text.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>>;

    /// Embed a batch of texts, order-preserving and same length as input.
    ///
    /// The default implementation embeds sequentially; backends override it
    /// with a true batch request or a concurrent fan-out.
    fn embed_many<'a>(
        &'a self,
        texts: &'a [String],
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Vec<f32>>, RagError>> + Send + 'a>> {
        Box::pin(async move {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        })
    }

    /// Expected vector length for this provider. Pure lookup, no network
    /// call.
    fn dimension(&self) -> usize;
}
