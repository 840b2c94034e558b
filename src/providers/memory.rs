//! In-memory vector index
//!
//! Brute-force cosine similarity over a `DashMap`. Suitable for local
//! deployments and tests; larger corpora should swap in a real ANN service
//! behind the same trait.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::types::VectorRecord;

use super::vector_index::{VectorIndexProvider, VectorMatch};

/// In-memory vector store keyed by vector id
#[derive(Default)]
pub struct MemoryVectorIndex {
    records: DashMap<String, VectorRecord>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

fn matches_filter(record: &VectorRecord, filter: &HashMap<String, String>) -> bool {
    filter
        .iter()
        .all(|(key, value)| record.metadata.get(key) == Some(value))
}

#[async_trait]
impl VectorIndexProvider for MemoryVectorIndex {
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        for record in records {
            self.records
                .insert(record.vector_id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(
        &self,
        embedding: &[f32],
        filter: &HashMap<String, String>,
        top_k: usize,
    ) -> Result<Vec<VectorMatch>> {
        // same contract as external services: a query vector must match the
        // dimension of the stored vectors
        if let Some(entry) = self
            .records
            .iter()
            .find(|e| e.value().embedding.len() != embedding.len())
        {
            return Err(Error::vector_index(format!(
                "query dimension {} does not match stored dimension {}",
                embedding.len(),
                entry.value().embedding.len()
            )));
        }

        let mut matches: Vec<VectorMatch> = self
            .records
            .iter()
            .filter(|entry| matches_filter(entry.value(), filter))
            .map(|entry| VectorMatch {
                score: cosine_similarity(embedding, &entry.value().embedding),
                record: entry.value().clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn delete(&self, vector_ids: &[String]) -> Result<usize> {
        let mut removed = 0;
        for id in vector_ids {
            if self.records.remove(id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.records.len())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
