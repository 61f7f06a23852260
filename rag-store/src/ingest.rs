//! Write-side pipeline: chunk → embed → upsert, plus metadata-scoped
//! deletion.
//!
//! Ingestion is all-or-nothing per batch: every embedding is computed
//! before a single upsert call persists the chunks, so a failed or
//! cancelled request writes nothing.

use qdrant_client::qdrant::PointStruct;
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::chunker::{ChunkingOptions, chunk_text};
use crate::config::StoreConfig;
use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::qdrant_facade::{QdrantFacade, chunk_payload};
use crate::record::{ChunkFilter, DocumentChunk, StoredChunk};

/// Upper bound on rows reported back from a metadata-scoped delete.
const DELETE_SCAN_LIMIT: usize = 10_000;

/// Options controlling [`crate::RagStore::ingest_text`].
#[derive(Clone, Debug, Default)]
pub struct IngestOptions {
    /// Chunking parameters; `chunking.metadata` is merged into every chunk.
    pub chunking: ChunkingOptions,
    /// Opaque owner identifier stamped into every stored chunk.
    pub owner_id: Option<String>,
    /// Delete existing chunks with the same `source` before inserting.
    pub replace: bool,
}

/// Chunk `text`, stamp the ingestion timestamp, optionally replace the
/// previous content of the same source, then insert.
pub(crate) async fn ingest_text(
    cfg: &StoreConfig,
    facade: &QdrantFacade,
    text: &str,
    opts: &IngestOptions,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<StoredChunk>, RagError> {
    let mut chunks = chunk_text(text, &opts.chunking)?;

    let ingested_at = chrono::Utc::now().to_rfc3339();
    for chunk in &mut chunks {
        chunk
            .metadata
            .insert("ingested_at".to_string(), Value::from(ingested_at.clone()));
    }

    if opts.replace {
        if let Some(source) = opts
            .chunking
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
        {
            let filter = ChunkFilter::by_source(source);
            let deleted = delete_by_metadata(facade, &filter, opts.owner_id.as_deref()).await?;
            info!(source, deleted = deleted.len(), "replaced existing source");
        }
    }

    insert_chunks(cfg, facade, chunks, opts.owner_id.as_deref(), provider).await
}

/// Embeds any chunk without a precomputed vector, enforces dimension
/// consistency, and persists the whole batch with one upsert.
///
/// # Errors
/// - [`RagError::EmptyBatch`] on empty input
/// - [`RagError::VectorSizeMismatch`] when any vector (computed or
///   precomputed) does not match the configured store dimension
pub(crate) async fn insert_chunks(
    cfg: &StoreConfig,
    facade: &QdrantFacade,
    mut chunks: Vec<DocumentChunk>,
    owner_id: Option<&str>,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<StoredChunk>, RagError> {
    if chunks.is_empty() {
        return Err(RagError::EmptyBatch);
    }

    let missing: Vec<usize> = chunks
        .iter()
        .enumerate()
        .filter(|(_, c)| c.embedding.is_none())
        .map(|(i, _)| i)
        .collect();

    if !missing.is_empty() {
        debug!(count = missing.len(), "embedding chunks without vectors");
        let texts: Vec<String> = missing.iter().map(|&i| chunks[i].content.clone()).collect();
        let vectors = provider.embed_many(&texts).await?;
        for (&i, v) in missing.iter().zip(vectors) {
            chunks[i].embedding = Some(v);
        }
    }

    for chunk in &chunks {
        let len = chunk.embedding.as_ref().map(Vec::len).unwrap_or(0);
        if len != cfg.dimension {
            return Err(RagError::VectorSizeMismatch {
                got: len,
                want: cfg.dimension,
            });
        }
    }

    facade.ensure_collection(cfg.dimension).await?;

    let mut points = Vec::with_capacity(chunks.len());
    let mut stored = Vec::with_capacity(chunks.len());
    for mut chunk in chunks {
        let id = Uuid::new_v4().to_string();
        let payload = chunk_payload(&chunk.content, &chunk.metadata, owner_id)?;
        let vector = chunk.embedding.take().unwrap_or_default();
        points.push(PointStruct::new(id.clone(), vector, payload));
        stored.push(StoredChunk {
            id,
            content: chunk.content,
            metadata: chunk.metadata,
        });
    }

    facade.upsert(points).await?;
    info!(chunks = stored.len(), "stored chunk batch");
    Ok(stored)
}

/// Deletes every chunk whose metadata matches all filter entries; `owner_id`
/// is an implicit extra equality condition. Returns the deleted rows.
///
/// # Errors
/// [`RagError::EmptyFilter`] when the filter carries no constraint — a blank
/// filter must never wipe the store.
pub(crate) async fn delete_by_metadata(
    facade: &QdrantFacade,
    filter: &ChunkFilter,
    owner_id: Option<&str>,
) -> Result<Vec<StoredChunk>, RagError> {
    if filter.is_empty() {
        return Err(RagError::EmptyFilter);
    }

    let qfilter = to_qdrant_filter(filter, owner_id);

    // Snapshot the matching rows first; Qdrant's delete reports no row set.
    let rows = facade.scroll(Some(qfilter.clone()), DELETE_SCAN_LIMIT).await?;
    facade.delete_by_filter(qfilter).await?;

    info!(deleted = rows.len(), "deleted chunks by metadata filter");
    Ok(rows
        .into_iter()
        .map(|r| StoredChunk {
            id: r.id,
            content: r.content,
            metadata: r.metadata,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Metadata;
    use std::future::Future;
    use std::pin::Pin;

    /// Always returns a constant vector of the configured length.
    struct StaticProvider(usize);

    impl EmbeddingsProvider for StaticProvider {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, RagError>> + Send + 'a>> {
            Box::pin(async move { Ok(vec![0.1; self.0]) })
        }

        fn dimension(&self) -> usize {
            self.0
        }
    }

    // Unreachable endpoint: any attempt to contact the store would error,
    // so an input-validation error proves nothing was touched.
    fn unreachable_cfg(dimension: usize) -> StoreConfig {
        StoreConfig::new("http://127.0.0.1:1", "test_chunks", dimension)
    }

    #[tokio::test]
    async fn empty_filter_is_rejected_without_touching_the_store() {
        let facade = QdrantFacade::new(&unreachable_cfg(4)).unwrap();
        let err = delete_by_metadata(&facade, &ChunkFilter::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmptyFilter));
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let cfg = unreachable_cfg(4);
        let facade = QdrantFacade::new(&cfg).unwrap();
        let err = insert_chunks(&cfg, &facade, Vec::new(), None, &StaticProvider(4))
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::EmptyBatch));
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected_before_any_write() {
        let cfg = unreachable_cfg(4);
        let facade = QdrantFacade::new(&cfg).unwrap();
        let chunks = vec![DocumentChunk {
            content: "mismatched".to_string(),
            metadata: Metadata::new(),
            embedding: Some(vec![0.1; 3]),
        }];
        let err = insert_chunks(&cfg, &facade, chunks, None, &StaticProvider(3))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::VectorSizeMismatch { got: 3, want: 4 }
        ));
    }
}
