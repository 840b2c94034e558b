//! Vector index provider trait

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::VectorRecord;

/// A ranked match returned by a similarity query
#[derive(Debug, Clone)]
pub struct VectorMatch {
    /// The matched record
    pub record: VectorRecord,
    /// Similarity score (higher is more similar)
    pub score: f32,
}

/// Trait over a black-box similarity-search service
///
/// Deletion by metadata is not assumed: the adapter in `retrieval` builds
/// `delete_by_document` from a filtered scan followed by delete-by-id.
#[async_trait]
pub trait VectorIndexProvider: Send + Sync {
    /// Insert or overwrite records, idempotent by `vector_id`
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Nearest-neighbor query with equality metadata filters,
    /// ranked descending by similarity
    async fn query(
        &self,
        embedding: &[f32],
        filter: &HashMap<String, String>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>>;

    /// Delete records by id, returning how many existed
    async fn delete(&self, vector_ids: &[String]) -> Result<usize>;

    /// Total number of stored vectors
    async fn len(&self) -> Result<usize>;

    /// Provider name for logging
    fn name(&self) -> &str;
}
