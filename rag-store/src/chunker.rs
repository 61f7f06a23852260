//! Overlap-aware text chunking.
//!
//! Splits cleaned text on paragraph boundaries and accumulates paragraphs
//! into chunks of at most `chunk_size` characters. When a chunk is emitted,
//! the tail of its buffer is carried into the next chunk so adjacent chunks
//! share trailing/leading context across the boundary.
//!
//! Policy for pathologically large paragraphs: a single paragraph longer
//! than `chunk_size` is emitted as its own chunk, never force-split
//! mid-sentence.

use serde_json::Value;
use tracing::debug;

use crate::errors::RagError;
use crate::record::{DocumentChunk, Metadata};

/// Default maximum characters per chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default characters of trailing context repeated into the next chunk.
pub const DEFAULT_CHUNK_OVERLAP: usize = 200;

/// Options controlling [`chunk_text`].
#[derive(Clone, Debug)]
pub struct ChunkingOptions {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters of trailing context carried into the next chunk.
    pub chunk_overlap: usize,
    /// Metadata merged into every produced chunk, alongside
    /// `chunk_index` / `total_chunks`.
    pub metadata: Metadata,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            metadata: Metadata::new(),
        }
    }
}

/// Splits `text` into an ordered sequence of overlapping chunks.
///
/// # Errors
/// Returns [`RagError::EmptyInput`] when the cleaned text is empty.
pub fn chunk_text(text: &str, opts: &ChunkingOptions) -> Result<Vec<DocumentChunk>, RagError> {
    let cleaned = normalize_whitespace(text);
    if cleaned.is_empty() {
        return Err(RagError::EmptyInput);
    }

    let chunk_size = opts.chunk_size.max(1);
    let overlap = opts.chunk_overlap;

    let mut pieces: Vec<String> = Vec::new();
    let mut buffer = String::new();

    for para in cleaned.split("\n\n").filter(|p| !p.is_empty()) {
        if buffer.is_empty() {
            buffer.push_str(para);
            continue;
        }

        if buffer.len() + 2 + para.len() > chunk_size {
            // Emit the buffer and seed the next one with its tail so the
            // boundary context survives retrieval.
            let tail = overlap_tail(&buffer, overlap).trim_start().to_string();
            pieces.push(std::mem::take(&mut buffer));
            if !tail.is_empty() {
                buffer.push_str(&tail);
                buffer.push_str("\n\n");
            }
            buffer.push_str(para);
        } else {
            buffer.push_str("\n\n");
            buffer.push_str(para);
        }
    }

    if !buffer.is_empty() {
        pieces.push(buffer);
    }

    debug!(chunks = pieces.len(), input_len = cleaned.len(), "chunked text");

    let total = pieces.len();
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, content)| {
            let mut metadata = opts.metadata.clone();
            metadata.insert("chunk_index".to_string(), Value::from(index));
            metadata.insert("total_chunks".to_string(), Value::from(total));
            DocumentChunk {
                content,
                metadata,
                embedding: None,
            }
        })
        .collect())
}

/// Collapses runs of spaces/tabs to a single space, runs of 3+ newlines to a
/// paragraph break, and trims the result. Single and double newlines are
/// preserved (they carry line and paragraph structure).
pub fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_newlines: Option<usize> = None;

    for ch in text.chars() {
        if ch == '\r' {
            continue;
        }
        if ch.is_whitespace() {
            let newlines = pending_newlines.get_or_insert(0);
            if ch == '\n' {
                *newlines += 1;
            }
        } else {
            if let Some(newlines) = pending_newlines.take() {
                if !out.is_empty() {
                    match newlines {
                        0 => out.push(' '),
                        1 => out.push('\n'),
                        _ => out.push_str("\n\n"),
                    }
                }
            }
            out.push(ch);
        }
    }

    out
}

/// The last `overlap` characters of `s`, aligned to a char boundary.
fn overlap_tail(s: &str, overlap: usize) -> &str {
    if overlap == 0 {
        return "";
    }
    if s.len() <= overlap {
        return s;
    }
    let mut start = s.len() - overlap;
    while !s.is_char_boundary(start) {
        start += 1;
    }
    &s[start..]
}
