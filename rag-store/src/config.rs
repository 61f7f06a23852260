//! Runtime and collection configuration.

use crate::errors::RagError;

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

/// Configuration for the chunk store.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Qdrant endpoint, e.g. `http://localhost:6334`.
    pub qdrant_url: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Distance function (Cosine by default).
    pub distance: DistanceKind,
    /// Embedding dimensionality enforced on every insert and query.
    pub dimension: usize,
    /// Fallback scans read up to `limit * fallback_scan_factor` rows to
    /// bound in-process ranking cost.
    pub fallback_scan_factor: usize,
}

impl StoreConfig {
    /// Creates a config with sane defaults for the given endpoint,
    /// collection, and embedding dimension.
    pub fn new(
        url: impl Into<String>,
        collection: impl Into<String>,
        dimension: usize,
    ) -> Self {
        Self {
            qdrant_url: url.into(),
            qdrant_api_key: None,
            collection: collection.into(),
            distance: DistanceKind::Cosine,
            dimension,
            fallback_scan_factor: 10,
        }
    }

    /// Build configuration from environment variables.
    ///
    /// Environment variables used:
    /// - `QDRANT_URL` (default: "http://localhost:6334")
    /// - `QDRANT_API_KEY` (optional)
    /// - `QDRANT_COLLECTION` (default: "document_chunks")
    pub fn from_env(dimension: usize) -> Self {
        let qdrant_url =
            std::env::var("QDRANT_URL").unwrap_or_else(|_| "http://localhost:6334".to_string());
        let collection =
            std::env::var("QDRANT_COLLECTION").unwrap_or_else(|_| "document_chunks".to_string());
        let mut cfg = Self::new(qdrant_url, collection, dimension);
        cfg.qdrant_api_key = std::env::var("QDRANT_API_KEY").ok();
        cfg
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.qdrant_url.trim().is_empty() {
            return Err(RagError::Config("qdrant_url is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.dimension == 0 {
            return Err(RagError::Config("dimension must be > 0".into()));
        }
        if self.fallback_scan_factor == 0 {
            return Err(RagError::Config("fallback_scan_factor must be > 0".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(StoreConfig::new("http://localhost:6334", "document_chunks", 768)
            .validate()
            .is_ok());
    }

    #[test]
    fn zero_dimension_is_rejected() {
        let cfg = StoreConfig::new("http://localhost:6334", "document_chunks", 0);
        assert!(matches!(cfg.validate(), Err(RagError::Config(_))));
    }

    #[test]
    fn empty_collection_is_rejected() {
        let cfg = StoreConfig::new("http://localhost:6334", "  ", 768);
        assert!(cfg.validate().is_err());
    }
}
