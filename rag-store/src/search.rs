//! Similarity search engine: native vector search with an in-process
//! cosine fallback.
//!
//! The native path delegates nearest-neighbor ranking to Qdrant with the
//! threshold pushed down; when the store signals that the native operator is
//! unusable, the engine scans raw rows and ranks them here. Both paths honor
//! the same contract: at most `limit` results, every similarity at or above
//! `threshold`, descending order.

use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::embed::EmbeddingsProvider;
use crate::errors::RagError;
use crate::filters::to_qdrant_filter;
use crate::qdrant_facade::QdrantFacade;
use crate::record::{ScannedChunk, ScoredChunk};

/// Options for a single similarity search.
#[derive(Clone, Debug)]
pub struct SearchOptions {
    /// Maximum number of results.
    pub limit: usize,
    /// Minimum cosine similarity for a chunk to qualify.
    pub threshold: f32,
    /// Optional metadata equality filter scoping the search.
    pub filter: Option<crate::record::ChunkFilter>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 0.3,
            filter: None,
        }
    }
}

/// Embeds the query and returns ranked, threshold-filtered chunks.
///
/// Fewer than `limit` results is a valid outcome, not an error. The only
/// side effects are the embedding call and store reads.
pub(crate) async fn search(
    cfg: &StoreConfig,
    facade: &QdrantFacade,
    query: &str,
    opts: &SearchOptions,
    provider: &dyn EmbeddingsProvider,
) -> Result<Vec<ScoredChunk>, RagError> {
    let query_vector = provider.embed(query).await?;
    if query_vector.len() != cfg.dimension {
        return Err(RagError::VectorSizeMismatch {
            got: query_vector.len(),
            want: cfg.dimension,
        });
    }

    let qfilter = opts
        .filter
        .as_ref()
        .filter(|f| !f.is_empty())
        .map(|f| to_qdrant_filter(f, None));

    match facade
        .search(
            query_vector.clone(),
            opts.limit,
            Some(opts.threshold),
            qfilter.clone(),
        )
        .await
    {
        Ok(hits) => {
            debug!(hits = hits.len(), "native similarity search succeeded");
            Ok(apply_threshold(hits, opts.threshold, opts.limit))
        }
        Err(RagError::NativeSearchUnavailable(reason)) => {
            warn!(%reason, "native search unavailable, falling back to scan + cosine");
            let scan_limit = opts
                .limit
                .saturating_mul(cfg.fallback_scan_factor)
                .max(opts.limit);
            let rows = facade.scroll(qfilter, scan_limit).await?;
            Ok(rank_by_cosine(
                &query_vector,
                rows,
                opts.threshold,
                opts.limit,
            ))
        }
        Err(e) => Err(e),
    }
}

/// Cosine similarity of two vectors.
///
/// Returns `0.0` when either vector is empty, the lengths differ, or either
/// norm is zero — a shape mismatch means "no similarity", never an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || b.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for i in 0..a.len() {
        dot += a[i] * b[i];
        norm_a += a[i] * a[i];
        norm_b += b[i] * b[i];
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 { 0.0 } else { dot / denom }
}

/// Scores scanned rows against the query vector and applies the result
/// contract (threshold filter, descending order, limit).
pub(crate) fn rank_by_cosine(
    query: &[f32],
    rows: Vec<ScannedChunk>,
    threshold: f32,
    limit: usize,
) -> Vec<ScoredChunk> {
    let hits = rows
        .into_iter()
        .map(|row| {
            let similarity = row
                .embedding
                .as_deref()
                .map(|e| cosine_similarity(query, e))
                .unwrap_or(0.0);
            ScoredChunk {
                id: row.id,
                content: row.content,
                metadata: row.metadata,
                similarity,
            }
        })
        .collect();
    apply_threshold(hits, threshold, limit)
}

fn apply_threshold(mut hits: Vec<ScoredChunk>, threshold: f32, limit: usize) -> Vec<ScoredChunk> {
    hits.retain(|h| h.similarity >= threshold);
    hits.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(limit);
    hits
}
