//! Chunking, embedding and retrieval over Qdrant.
//!
//! This crate provides a clean API to:
//! - Split raw text into overlapping chunks
//! - Embed chunks through a pluggable provider and persist them
//! - Retrieve the most relevant chunks for a query, with a pure in-process
//!   cosine fallback when the store's native search path is unavailable
//! - Delete chunks in bulk by exact metadata equality
//!
//! The design is flat and splits responsibilities into focused modules.

mod chunker;
mod config;
mod embed;
mod embed_pool;
mod errors;
mod filters;
mod ingest;
mod qdrant_facade;
mod record;
mod search;

pub use chunker::{
    ChunkingOptions, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, chunk_text, normalize_whitespace,
};
pub use config::{DistanceKind, StoreConfig};
pub use embed::{EmbeddingsProvider, OllamaEmbedder, OpenAiEmbedder};
pub use errors::RagError;
pub use ingest::IngestOptions;
pub use record::{
    ChunkFilter, DocumentChunk, IngestReceipt, IngestedChunkView, Metadata, ScannedChunk,
    ScoredChunk, StoredChunk, content_preview,
};
pub use search::{SearchOptions, cosine_similarity};

use tracing::trace;

/// High-level facade that wires configuration and the Qdrant client.
///
/// This is the single entry point recommended for application code. The
/// store holds no per-request state; the embedding provider is supplied per
/// call so different tenants can use different backends.
pub struct RagStore {
    cfg: StoreConfig,
    client: qdrant_facade::QdrantFacade,
}

impl RagStore {
    /// Constructs a new store from the given configuration.
    ///
    /// # Errors
    /// Returns `RagError::Config` on invalid configuration, or
    /// `RagError::Qdrant` if the client cannot be initialized.
    pub fn new(cfg: StoreConfig) -> Result<Self, RagError> {
        trace!("RagStore::new collection={}", cfg.collection);
        let client = qdrant_facade::QdrantFacade::new(&cfg)?;
        Ok(Self { cfg, client })
    }

    /// The configured embedding dimension.
    pub fn dimension(&self) -> usize {
        self.cfg.dimension
    }

    /// Chunks `text`, embeds every chunk, and persists the batch atomically.
    /// Returns the stored chunks with their assigned ids.
    ///
    /// # Errors
    /// Returns `RagError::EmptyInput` on empty text, embedding provider
    /// errors, or `RagError::Qdrant` on store failures. No partial inserts
    /// are reported as success.
    pub async fn ingest_text(
        &self,
        text: &str,
        opts: &IngestOptions,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<StoredChunk>, RagError> {
        trace!("RagStore::ingest_text len={}", text.len());
        ingest::ingest_text(&self.cfg, &self.client, text, opts, provider).await
    }

    /// Inserts pre-chunked content (embeddings computed here if missing).
    ///
    /// # Errors
    /// Returns `RagError::EmptyBatch` on empty input and
    /// `RagError::VectorSizeMismatch` when a vector does not match the
    /// configured dimension.
    pub async fn insert_chunks(
        &self,
        chunks: Vec<DocumentChunk>,
        owner_id: Option<&str>,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<StoredChunk>, RagError> {
        trace!("RagStore::insert_chunks count={}", chunks.len());
        ingest::insert_chunks(&self.cfg, &self.client, chunks, owner_id, provider).await
    }

    /// Deletes every chunk matching all filter entries (plus the implicit
    /// owner condition when supplied) and returns the deleted rows.
    ///
    /// # Errors
    /// Returns `RagError::EmptyFilter` when the filter is empty — bulk
    /// deletion without a constraint is a caller error.
    pub async fn delete_by_metadata(
        &self,
        filter: &ChunkFilter,
        owner_id: Option<&str>,
    ) -> Result<Vec<StoredChunk>, RagError> {
        trace!("RagStore::delete_by_metadata equals={}", filter.equals.len());
        ingest::delete_by_metadata(&self.client, filter, owner_id).await
    }

    /// Embeds `query` and returns ranked chunks: at most `opts.limit`
    /// entries, all with `similarity >= opts.threshold`, descending.
    ///
    /// Falls back to a scan + in-process cosine ranking when the native
    /// search path is unavailable; that switch is invisible to callers.
    pub async fn search(
        &self,
        query: &str,
        opts: &SearchOptions,
        provider: &dyn EmbeddingsProvider,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        trace!(
            "RagStore::search limit={} threshold={}",
            opts.limit, opts.threshold
        );
        search::search(&self.cfg, &self.client, query, opts, provider).await
    }
}
