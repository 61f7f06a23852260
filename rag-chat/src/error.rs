//! Typed error for the rag-chat crate.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChatError {
    /// The query was empty or not usable. Never retried; maps to a
    /// 400-equivalent at the service boundary.
    #[error("query text is required")]
    EmptyQuery,

    /// Errors from the underlying rag-store crate.
    #[error("RAG error: {0}")]
    Rag(#[from] rag_store::RagError),

    /// Errors from the LLM provider layer.
    #[error("LLM error: {0}")]
    Llm(#[from] ai_llm_service::AiLlmError),
}
