//! Document metadata registry
//!
//! In-memory `DashMap` as the source of truth, persisted to a JSON file on
//! every mutation (whole-file replace). Status transitions are compare-and-set
//! under the entry lock so concurrent workers cannot both move a document to
//! `Processing`.

use dashmap::DashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{Document, DocumentStatus};

/// Registry of document records
pub struct DocumentRegistry {
    documents: DashMap<Uuid, Document>,
    path: PathBuf,
}

impl DocumentRegistry {
    /// Load the registry from disk, starting empty if the file is absent
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let documents = DashMap::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let records: Vec<Document> = serde_json::from_str(&contents)?;
                let count = records.len();
                for doc in records {
                    documents.insert(doc.id, doc);
                }
                tracing::info!("Loaded {} documents from {}", count, path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No document registry at {}, starting empty", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self { documents, path })
    }

    async fn save(&self) -> Result<()> {
        let records: Vec<Document> = self
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Insert a new document record
    pub async fn insert(&self, document: Document) -> Result<()> {
        self.documents.insert(document.id, document);
        self.save().await
    }

    /// Look up a document by id
    pub fn get(&self, id: Uuid) -> Result<Document> {
        self.documents
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::DocumentNotFound(id))
    }

    /// List all documents, newest first
    pub fn list(&self) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .documents
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        docs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        docs
    }

    /// Find a document with the given content hash, if any
    pub fn find_by_hash(&self, content_hash: &str) -> Option<Document> {
        self.documents
            .iter()
            .find(|entry| entry.value().content_hash == content_hash)
            .map(|entry| entry.value().clone())
    }

    /// Remove a document record
    pub async fn remove(&self, id: Uuid) -> Result<Document> {
        let (_, doc) = self
            .documents
            .remove(&id)
            .ok_or(Error::DocumentNotFound(id))?;
        self.save().await?;
        Ok(doc)
    }

    /// Compare-and-set transition from `expected` status to `next`
    ///
    /// Fails with `InvalidState` if the document is not in `expected`, so a
    /// lost race surfaces as an error instead of a double transition.
    async fn transition(
        &self,
        id: Uuid,
        expected: DocumentStatus,
        next: DocumentStatus,
        update: impl FnOnce(&mut Document),
    ) -> Result<Document> {
        let updated = {
            let mut entry = self
                .documents
                .get_mut(&id)
                .ok_or(Error::DocumentNotFound(id))?;
            let doc = entry.value_mut();
            if doc.status != expected {
                return Err(Error::InvalidState {
                    document_id: id,
                    expected,
                    actual: doc.status,
                });
            }
            doc.status = next;
            doc.updated_at = chrono::Utc::now();
            update(doc);
            doc.clone()
        };
        self.save().await?;
        Ok(updated)
    }

    /// Claim a pending document for processing
    pub async fn begin_processing(&self, id: Uuid) -> Result<Document> {
        self.transition(id, DocumentStatus::Pending, DocumentStatus::Processing, |doc| {
            doc.error = None;
        })
        .await
    }

    /// Mark a processing document completed with its indexed vector ids
    pub async fn complete(&self, id: Uuid, vector_ids: Vec<String>) -> Result<Document> {
        self.transition(id, DocumentStatus::Processing, DocumentStatus::Completed, |doc| {
            doc.vector_ids = vector_ids;
            doc.error = None;
        })
        .await
    }

    /// Mark a processing document failed with an error message
    pub async fn fail(&self, id: Uuid, error: String) -> Result<Document> {
        self.transition(id, DocumentStatus::Processing, DocumentStatus::Failed, |doc| {
            doc.vector_ids.clear();
            doc.error = Some(error);
        })
        .await
    }

    /// Move a failed document back to pending for another attempt
    pub async fn mark_retry(&self, id: Uuid) -> Result<Document> {
        self.transition(id, DocumentStatus::Failed, DocumentStatus::Pending, |doc| {
            doc.error = None;
        })
        .await
    }

    /// Documents that have sat in `Failed` since before `cutoff`
    pub fn failed_before(&self, cutoff: chrono::DateTime<chrono::Utc>) -> Vec<Document> {
        self.documents
            .iter()
            .filter(|entry| {
                let doc = entry.value();
                doc.status == DocumentStatus::Failed && doc.updated_at < cutoff
            })
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
