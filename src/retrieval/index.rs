//! Vector index adapter
//!
//! Adds per-call timeouts and composes the operations the pipeline and query
//! engine need from the narrow provider trait. Delete-by-document is built
//! from a metadata-filtered scan followed by delete-by-id, since the provider
//! is not assumed to support deletion by filter.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::RetrievalConfig;
use crate::error::{Error, Result};
use crate::providers::{VectorIndexProvider, VectorMatch};
use crate::types::VectorRecord;

/// Timeout-wrapped facade over the vector index provider
pub struct VectorIndex {
    provider: Arc<dyn VectorIndexProvider>,
    timeout: Duration,
    delete_scan_limit: usize,
    dimensions: usize,
}

impl VectorIndex {
    /// `dimensions` is the embedding dimension of the index, used to shape
    /// the probe vector for metadata-only scans
    pub fn new(
        provider: Arc<dyn VectorIndexProvider>,
        config: &RetrievalConfig,
        dimensions: usize,
    ) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(config.timeout_secs),
            delete_scan_limit: config.delete_scan_limit,
            dimensions,
        }
    }

    async fn with_timeout<T>(
        &self,
        what: &str,
        fut: impl std::future::Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| Error::Timeout(format!("{} via {}", what, self.provider.name())))?
    }

    /// Insert or overwrite records
    pub async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        self.with_timeout("upsert", self.provider.upsert(records))
            .await
    }

    /// Similarity search, optionally scoped to a set of documents
    ///
    /// With a scope of more than one document the provider is queried per
    /// document and results are re-ranked, since filters are conjunctive
    /// equality matches.
    pub async fn search(
        &self,
        embedding: &[f32],
        document_scope: Option<&[Uuid]>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        let scope = match document_scope {
            None => {
                return self
                    .with_timeout("query", self.provider.query(embedding, &HashMap::new(), top_k))
                    .await;
            }
            Some(ids) => ids,
        };

        if scope.is_empty() {
            return Ok(Vec::new());
        }

        let mut matches = Vec::new();
        for document_id in scope {
            let mut filter = HashMap::new();
            filter.insert(
                VectorRecord::DOCUMENT_ID.to_string(),
                document_id.to_string(),
            );
            let scoped = self
                .with_timeout("query", self.provider.query(embedding, &filter, top_k))
                .await?;
            matches.extend(scoped);
        }

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);
        Ok(matches)
    }

    /// Delete every vector belonging to a document, returning how many went
    ///
    /// Scan-then-delete: list ids by metadata filter, then delete by id. Not
    /// atomic against concurrent writers, so callers serialize per document.
    pub async fn delete_by_document(&self, document_id: Uuid) -> Result<usize> {
        let mut filter = HashMap::new();
        filter.insert(
            VectorRecord::DOCUMENT_ID.to_string(),
            document_id.to_string(),
        );

        // zero vector of the index's dimension: similarity is irrelevant,
        // only the filter matters, but providers reject mismatched shapes
        let probe = vec![0.0f32; self.dimensions];
        let matches = self
            .with_timeout(
                "delete scan",
                self.provider.query(&probe, &filter, self.delete_scan_limit),
            )
            .await?;

        if matches.len() >= self.delete_scan_limit {
            tracing::warn!(
                "Delete scan for document {} hit the limit of {}; some vectors may remain",
                document_id,
                self.delete_scan_limit
            );
        }

        if matches.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = matches
            .into_iter()
            .map(|m| m.record.vector_id)
            .collect();

        self.delete_ids(&ids).await
    }

    /// Delete specific vectors by id
    pub async fn delete_ids(&self, vector_ids: &[String]) -> Result<usize> {
        if vector_ids.is_empty() {
            return Ok(0);
        }
        self.with_timeout("delete", self.provider.delete(vector_ids))
            .await
    }

    /// Total vectors currently indexed
    pub async fn total_vectors(&self) -> Result<usize> {
        self.with_timeout("len", self.provider.len()).await
    }
}
