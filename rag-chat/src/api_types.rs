//! Public API types re-used by external callers (e.g., an HTTP layer).

use rag_store::{ChunkFilter, Metadata, ScoredChunk};
use serde::{Deserialize, Serialize};

/// Options that control retrieval for a single question.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AnswerOptions {
    /// Maximum chunks to retrieve.
    pub limit: usize,
    /// Minimum cosine similarity for a chunk to qualify.
    pub threshold: f32,
    /// Optional metadata equality filter scoping the first retrieval
    /// attempt; widening drops it when nothing matches.
    pub filter: Option<ChunkFilter>,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self {
            limit: 5,
            threshold: 0.3,
            filter: None,
        }
    }
}

/// A redacted view of a context chunk that was fed to the model: similarity
/// score and metadata only, never the full content.
#[derive(Clone, Debug, Serialize)]
pub struct UsedChunk {
    pub similarity: f32,
    pub metadata: Metadata,
}

impl From<ScoredChunk> for UsedChunk {
    fn from(chunk: ScoredChunk) -> Self {
        Self {
            similarity: chunk.similarity,
            metadata: chunk.metadata,
        }
    }
}

/// Final answer envelope.
#[derive(Clone, Debug, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    /// Provider that produced (or would have produced) the answer.
    pub provider: String,
    /// Number of chunks used as context.
    pub chunks_used: usize,
    /// Redacted views of the chunks, for attribution/debugging.
    pub chunks: Vec<UsedChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_deserialize_with_defaults() {
        let opts: AnswerOptions = serde_json::from_str(r#"{"threshold": 0.1}"#).unwrap();
        assert_eq!(opts.limit, 5);
        assert_eq!(opts.threshold, 0.1);
        assert!(opts.filter.is_none());
    }

    #[test]
    fn used_chunk_drops_content() {
        let chunk = ScoredChunk {
            id: "1".to_string(),
            content: "secret full text".to_string(),
            metadata: Metadata::from([("source".to_string(), serde_json::Value::from("faq"))]),
            similarity: 0.7,
        };
        let used = UsedChunk::from(chunk);
        let json = serde_json::to_value(&used).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["metadata"]["source"], "faq");
    }
}
