//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! This facade concentrates all Qdrant interactions behind a minimal API,
//! hiding away the verbose builder pattern and keeping the rest of the
//! library decoupled from `qdrant-client`. It also classifies one failure
//! specially: a missing collection (or an unimplemented search path) is
//! reported as [`RagError::NativeSearchUnavailable`] so the search engine
//! can run its fallback instead of treating it as a hard error.

use std::collections::BTreeMap;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct, RetrievedPoint,
    ScoredPoint, ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder,
    VectorParamsBuilder,
};
use tracing::{debug, info, warn};

use crate::config::{DistanceKind, StoreConfig};
use crate::errors::RagError;
use crate::record::{Metadata, ScannedChunk, ScoredChunk};

/// A facade over the Qdrant client.
///
/// Encapsulates the underlying client, the target collection name, and the
/// distance function of the vector space.
pub(crate) struct QdrantFacade {
    client: Qdrant,
    collection: String,
    distance: DistanceKind,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    pub(crate) fn new(cfg: &StoreConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url);
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
            distance: cfg.distance,
        })
    }

    /// Ensures that the collection exists.
    ///
    /// - If the collection already exists → no-op.
    /// - If missing → creates it with the given dimension and the configured
    ///   distance function.
    pub(crate) async fn ensure_collection(&self, dimension: usize) -> Result<(), RagError> {
        match self.client.collection_info(&self.collection).await {
            Ok(_) => {
                debug!("collection '{}' already exists", self.collection);
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "collection '{}' not found, will be created (error={})",
                    self.collection, err
                );
            }
        }

        let distance = match self.distance {
            DistanceKind::Cosine => Distance::Cosine,
            DistanceKind::Dot => Distance::Dot,
            DistanceKind::Euclid => Distance::Euclid,
        };

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection)
                    .vectors_config(VectorParamsBuilder::new(dimension as u64, distance)),
            )
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        info!(
            "collection '{}' created with dimension {}",
            self.collection, dimension
        );
        Ok(())
    }

    /// Upserts a batch of points in a single call and waits for the write to
    /// be applied. No partial success is reported: the call either persists
    /// the whole batch or fails.
    pub(crate) async fn upsert(&self, points: Vec<PointStruct>) -> Result<(), RagError> {
        if points.is_empty() {
            debug!("no points provided for upsert");
            return Ok(());
        }

        info!(
            "upserting {} points into collection '{}'",
            points.len(),
            self.collection
        );

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        Ok(())
    }

    /// Native nearest-neighbor search with a score threshold pushed down to
    /// the backend. Results come back ordered by similarity, capped at
    /// `limit`.
    ///
    /// # Errors
    /// [`RagError::NativeSearchUnavailable`] when the native path cannot be
    /// used (missing collection, unimplemented operator); callers are
    /// expected to fall back to [`Self::scroll`].
    pub(crate) async fn search(
        &self,
        vector: Vec<f32>,
        limit: usize,
        score_threshold: Option<f32>,
        filter: Option<Filter>,
    ) -> Result<Vec<ScoredChunk>, RagError> {
        debug!(
            "searching '{}' with limit={} threshold={:?}",
            self.collection, limit, score_threshold
        );

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, limit as u64).with_payload(true);
        if let Some(t) = score_threshold {
            builder = builder.score_threshold(t);
        }
        if let Some(f) = filter {
            builder = builder.filter(f);
        }

        let resp = self.client.search_points(builder).await.map_err(|e| {
            let msg = e.to_string();
            if is_native_search_unavailable(&msg) {
                RagError::NativeSearchUnavailable(msg)
            } else {
                RagError::Qdrant(msg)
            }
        })?;

        Ok(resp.result.into_iter().map(scored_point_to_chunk).collect())
    }

    /// Reads raw rows (payload and vectors) matching the filter, capped at
    /// `limit`. Used only by the fallback ranking path.
    ///
    /// A missing collection is treated as an empty store, not an error.
    pub(crate) async fn scroll(
        &self,
        filter: Option<Filter>,
        limit: usize,
    ) -> Result<Vec<ScannedChunk>, RagError> {
        debug!("scrolling '{}' with limit={}", self.collection, limit);

        let mut builder = ScrollPointsBuilder::new(&self.collection)
            .limit(limit as u32)
            .with_payload(true)
            .with_vectors(true);
        if let Some(f) = filter {
            builder = builder.filter(f);
        }

        let resp = match self.client.scroll(builder).await {
            Ok(resp) => resp,
            Err(e) => {
                let msg = e.to_string();
                if is_native_search_unavailable(&msg) {
                    debug!("scroll on missing collection treated as empty store");
                    return Ok(Vec::new());
                }
                return Err(RagError::Qdrant(msg));
            }
        };

        Ok(resp
            .result
            .into_iter()
            .map(retrieved_point_to_chunk)
            .collect())
    }

    /// Deletes every point matching the filter and waits for the write.
    pub(crate) async fn delete_by_filter(&self, filter: Filter) -> Result<(), RagError> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(filter)
                    .wait(true),
            )
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;
        Ok(())
    }
}

/// Builds the stored payload for a chunk: `content` plus every metadata key
/// flattened to the top level (which is what equality filters match on), and
/// the optional owner id.
pub(crate) fn chunk_payload(
    content: &str,
    metadata: &Metadata,
    owner_id: Option<&str>,
) -> Result<qdrant_client::Payload, RagError> {
    let json = chunk_payload_json(content, metadata, owner_id);
    qdrant_client::Payload::try_from(json)
        .map_err(|e| RagError::Qdrant(format!("payload convert: {e}")))
}

fn chunk_payload_json(
    content: &str,
    metadata: &Metadata,
    owner_id: Option<&str>,
) -> serde_json::Value {
    let mut map = serde_json::Map::with_capacity(metadata.len() + 2);
    map.insert("content".to_string(), serde_json::Value::from(content));
    for (k, v) in metadata {
        map.insert(k.clone(), v.clone());
    }
    if let Some(owner) = owner_id {
        map.insert("owner_id".to_string(), serde_json::Value::from(owner));
    }
    serde_json::Value::Object(map)
}

fn point_id_to_string(id: Option<qdrant_client::qdrant::PointId>) -> String {
    match id.and_then(|pid| pid.point_id_options) {
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(s)) => s,
        Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(n)) => n.to_string(),
        None => String::new(),
    }
}

fn payload_to_parts(
    payload: std::collections::HashMap<String, qdrant_client::qdrant::Value>,
) -> (String, Metadata) {
    let mut content = String::new();
    let mut metadata = BTreeMap::new();
    for (key, value) in payload {
        let json = value.into_json();
        if key == "content" {
            if let Some(s) = json.as_str() {
                content = s.to_string();
            }
        } else {
            metadata.insert(key, json);
        }
    }
    (content, metadata)
}

fn scored_point_to_chunk(sp: ScoredPoint) -> ScoredChunk {
    let id = point_id_to_string(sp.id);
    let (content, metadata) = payload_to_parts(sp.payload);
    ScoredChunk {
        id,
        content,
        metadata,
        similarity: sp.score,
    }
}

fn retrieved_point_to_chunk(rp: RetrievedPoint) -> ScannedChunk {
    let id = point_id_to_string(rp.id);
    let embedding = rp.vectors.and_then(|vectors| match vectors.vectors_options {
        Some(qdrant_client::qdrant::vectors_output::VectorsOptions::Vector(v)) => Some(v.data),
        _ => None,
    });
    let (content, metadata) = payload_to_parts(rp.payload);
    ScannedChunk {
        id,
        content,
        metadata,
        embedding,
    }
}

/// Heuristic classification of "the native search path is not usable here":
/// the collection does not exist, or the server reports the operation as
/// unimplemented.
fn is_native_search_unavailable(msg: &str) -> bool {
    let m = msg.to_lowercase();
    let missing_collection = m.contains("collection")
        && (m.contains("not found") || m.contains("doesn't exist") || m.contains("does not exist"));
    missing_collection || m.contains("unimplemented") || m.contains("not implemented")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_collection_is_classified_unavailable() {
        assert!(is_native_search_unavailable(
            "Collection `document_chunks` doesn't exist!"
        ));
        assert!(is_native_search_unavailable(
            "status: NotFound, message: \"Collection document_chunks not found\""
        ));
        assert!(is_native_search_unavailable("status: Unimplemented"));
    }

    #[test]
    fn other_errors_stay_fatal() {
        assert!(!is_native_search_unavailable("connection refused"));
        assert!(!is_native_search_unavailable(
            "Wrong input: vector size mismatch"
        ));
    }

    #[test]
    fn payload_flattens_metadata_next_to_content() {
        let metadata = Metadata::from([
            ("source".to_string(), serde_json::Value::from("faq")),
            ("chunk_index".to_string(), serde_json::Value::from(0)),
        ]);
        let json = chunk_payload_json("hello", &metadata, Some("user-1"));
        assert_eq!(json["content"], "hello");
        assert_eq!(json["source"], "faq");
        assert_eq!(json["chunk_index"], 0);
        assert_eq!(json["owner_id"], "user-1");
        assert!(chunk_payload("hello", &metadata, Some("user-1")).is_ok());
    }
}
