//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
///
/// The caller-input variants (`EmptyInput`, `EmptyBatch`, `EmptyFilter`) map
/// to 400-equivalents at the service boundary and are never retried; the
/// backend variants map to 500-equivalents. `NativeSearchUnavailable` is the
/// one expected internal error: the search engine converts it into fallback
/// execution and it never reaches callers.
#[derive(Debug, Error)]
pub enum RagError {
    /// Input text was empty or whitespace-only.
    #[error("input text is empty")]
    EmptyInput,

    /// An insert was attempted with no chunks.
    #[error("no chunks provided")]
    EmptyBatch,

    /// A delete was attempted with an empty metadata filter.
    #[error("refusing to delete with an empty metadata filter")]
    EmptyFilter,

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Mismatch in vector dimensionality.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// The store's native nearest-neighbor path is not usable; callers fall
    /// back to scanning + in-process ranking.
    #[error("native similarity search unavailable: {0}")]
    NativeSearchUnavailable(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),

    /// Embedding/LLM provider errors (wrapped).
    #[error("provider error: {0}")]
    Provider(#[from] ai_llm_service::AiLlmError),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
