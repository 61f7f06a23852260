//! Core data models used by the library.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Open mapping of metadata keys to scalar values. The pipeline treats it as
/// an opaque, equality-filterable bag; keys are application-defined
/// (`source`, `category`, `chunk_index`, ...).
pub type Metadata = BTreeMap<String, Value>;

/// A chunk of source text on its way into the store.
///
/// `embedding` is filled during ingestion, before the insert; dimension is
/// decided by the active embedding provider.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// A chunk as persisted, with its store-assigned id.
#[derive(Clone, Debug, Serialize)]
pub struct StoredChunk {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
}

/// A retrieval hit: chunk plus its similarity score.
#[derive(Clone, Debug)]
pub struct ScoredChunk {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub similarity: f32,
}

/// A raw row from the fallback scan path, embedding included. Only used to
/// rank in-process when the store's native search is unavailable.
#[derive(Clone, Debug)]
pub struct ScannedChunk {
    pub id: String,
    pub content: String,
    pub metadata: Metadata,
    pub embedding: Option<Vec<f32>>,
}

/// Exact-equality filter over chunk metadata fields.
///
/// Every entry must match (conjunction); an empty filter means
/// "no constraint" for search and is rejected for deletion.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkFilter {
    pub equals: Vec<(String, Value)>,
}

impl ChunkFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an equality constraint. Builder-style.
    pub fn equals(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.equals.push((key.into(), value.into()));
        self
    }

    /// Convenience constructor for the common `source = <name>` filter.
    pub fn by_source(source: &str) -> Self {
        Self::new().equals("source", source)
    }

    pub fn is_empty(&self) -> bool {
        self.equals.is_empty()
    }
}

/// Receipt returned to ingestion callers: how many chunks were created and
/// a redacted view of each (id, clamped preview, metadata).
#[derive(Clone, Debug, Serialize)]
pub struct IngestReceipt {
    pub chunks_created: usize,
    pub chunks: Vec<IngestedChunkView>,
}

/// One stored chunk as reported in an [`IngestReceipt`].
#[derive(Clone, Debug, Serialize)]
pub struct IngestedChunkView {
    pub id: String,
    pub content_preview: String,
    pub metadata: Metadata,
}

impl From<Vec<StoredChunk>> for IngestReceipt {
    fn from(stored: Vec<StoredChunk>) -> Self {
        Self {
            chunks_created: stored.len(),
            chunks: stored
                .into_iter()
                .map(|c| IngestedChunkView {
                    id: c.id,
                    content_preview: content_preview(&c.content, 100),
                    metadata: c.metadata,
                })
                .collect(),
        }
    }
}

/// Returns a clamped, single-purpose preview of chunk content for receipts
/// and response envelopes. Never splits inside a UTF-8 character.
pub fn content_preview(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        return content.to_string();
    }
    let truncated: String = content.chars().take(max_chars).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_builder_accumulates_constraints() {
        let f = ChunkFilter::by_source("faq").equals("category", "shipping");
        assert_eq!(f.equals.len(), 2);
        assert!(!f.is_empty());
        assert!(ChunkFilter::new().is_empty());
    }

    #[test]
    fn preview_is_clamped_and_char_safe() {
        assert_eq!(content_preview("short", 100), "short");
        let long = "é".repeat(150);
        let preview = content_preview(&long, 100);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), 103);
    }
}
