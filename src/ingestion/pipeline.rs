//! Ingestion pipeline
//!
//! Drives a document through its lifecycle: store bytes, extract text, chunk,
//! embed, index, and flip the status. All work on one document id is
//! serialized through a per-document async lock, and status moves are
//! compare-and-set in the registry, so a retry can never interleave with an
//! in-flight attempt.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::{ProcessingConfig, UploadConfig};
use crate::embedding::EmbeddingGateway;
use crate::error::{Error, Result};
use crate::ingestion::Chunker;
use crate::providers::TextExtractor;
use crate::retrieval::VectorIndex;
use crate::storage::{DocumentRegistry, FileStore};
use crate::types::{Document, DocumentStatus, FileType, VectorRecord};

/// Orchestrates document ingestion end to end
pub struct IngestionPipeline {
    registry: Arc<DocumentRegistry>,
    files: Arc<FileStore>,
    chunker: Chunker,
    gateway: Arc<EmbeddingGateway>,
    index: Arc<VectorIndex>,
    extractor: Arc<dyn TextExtractor>,
    upload: UploadConfig,
    ingest_timeout: Duration,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl IngestionPipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        registry: Arc<DocumentRegistry>,
        files: Arc<FileStore>,
        chunker: Chunker,
        gateway: Arc<EmbeddingGateway>,
        index: Arc<VectorIndex>,
        extractor: Arc<dyn TextExtractor>,
        upload: UploadConfig,
        processing: &ProcessingConfig,
    ) -> Self {
        Self {
            registry,
            files,
            chunker,
            gateway,
            index,
            extractor,
            upload,
            ingest_timeout: Duration::from_secs(processing.ingest_timeout_secs),
            locks: DashMap::new(),
        }
    }

    fn lock_for(&self, id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Validate an upload and create a pending document record
    ///
    /// All validation happens before any state is created: a rejected upload
    /// leaves no file and no record behind.
    pub async fn create_document(&self, filename: &str, bytes: &[u8]) -> Result<Document> {
        let extension = filename
            .rsplit('.')
            .next()
            .filter(|ext| *ext != filename)
            .map(str::to_lowercase)
            .unwrap_or_default();

        if !self.upload.allowed_extensions.contains(&extension) {
            return Err(Error::UnsupportedFileType(filename.to_string()));
        }

        let size = bytes.len() as u64;
        if size > self.upload.max_file_size {
            return Err(Error::FileTooLarge {
                size,
                max: self.upload.max_file_size,
            });
        }

        let content_hash = hex::encode(Sha256::digest(bytes));
        if let Some(existing) = self.registry.find_by_hash(&content_hash) {
            tracing::info!(
                "Upload '{}' duplicates document {} ('{}')",
                filename,
                existing.id,
                existing.title
            );
            return Ok(existing);
        }

        let file_type = FileType::from_filename(filename);
        let mut document = Document::new(
            filename.to_string(),
            Default::default(),
            file_type,
            content_hash,
            size,
        );
        document.source_uri = self.files.save(document.id, file_type, bytes).await?;

        self.registry.insert(document.clone()).await?;
        tracing::info!("Created document {} ('{}')", document.id, document.title);
        Ok(document)
    }

    /// Run one ingestion attempt for a pending document
    ///
    /// On success the document lands in `Completed` with its vector ids; on
    /// any failure it lands in `Failed` with the error recorded. Either way
    /// the `Processing` state is never left dangling.
    pub async fn ingest(&self, document_id: Uuid) -> Result<Document> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let document = self.registry.begin_processing(document_id).await?;
        tracing::info!("Ingesting document {} ('{}')", document.id, document.title);

        let outcome = tokio::time::timeout(self.ingest_timeout, self.run_attempt(&document))
            .await
            .unwrap_or_else(|_| {
                Err(Error::Timeout(format!("ingestion of document {}", document_id)))
            });

        match outcome {
            Ok(vector_ids) => {
                let count = vector_ids.len();
                let doc = self.registry.complete(document_id, vector_ids).await?;
                tracing::info!("Document {} completed with {} vectors", document_id, count);
                Ok(doc)
            }
            Err(e) => {
                tracing::error!("Ingestion of document {} failed: {}", document_id, e);
                self.registry.fail(document_id, e.to_string()).await?;
                Err(e)
            }
        }
    }

    async fn run_attempt(&self, document: &Document) -> Result<Vec<String>> {
        let bytes = self.files.read(&document.source_uri).await?;
        let content_type = mime_guess::from_path(&document.source_uri)
            .first_raw()
            .unwrap_or_else(|| document.file_type.content_type());
        let text = self
            .extractor
            .extract(&bytes, content_type)
            .await
            .map_err(|e| match e {
                Error::Extraction { message, .. } => Error::extraction(&document.title, message),
                other => other,
            })?;

        let chunks = self.chunker.chunk(document.id, &text);
        if chunks.is_empty() {
            return Err(Error::extraction(
                &document.title,
                "document contains no extractable text",
            ));
        }
        tracing::debug!("Document {} split into {} chunks", document.id, chunks.len());

        // purge any vectors a previous attempt left behind
        let stale = self.index.delete_by_document(document.id).await?;
        if stale > 0 {
            tracing::debug!("Removed {} stale vectors for document {}", stale, document.id);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.gateway.embed_batch(&texts).await?;

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| VectorRecord::from_chunk(chunk, embedding, &document.title))
            .collect();

        self.index.upsert(&records).await?;

        Ok(records.into_iter().map(|r| r.vector_id).collect())
    }

    /// Move a failed document back to pending so it can be re-enqueued
    pub async fn retry(&self, document_id: Uuid) -> Result<Document> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;
        let doc = self.registry.mark_retry(document_id).await?;
        tracing::info!("Document {} queued for retry", document_id);
        Ok(doc)
    }

    /// Delete a document: file, vectors, then the record
    ///
    /// The record is removed last. If vector deletion fails the record stays,
    /// pointing at the vectors, so the state is still reachable for a later
    /// delete instead of silently leaking vectors.
    pub async fn delete(&self, document_id: Uuid) -> Result<()> {
        let lock = self.lock_for(document_id);
        let _guard = lock.lock().await;

        let document = self.registry.get(document_id)?;
        if document.status == DocumentStatus::Processing {
            return Err(Error::InvalidState {
                document_id,
                expected: DocumentStatus::Completed,
                actual: DocumentStatus::Processing,
            });
        }

        self.purge(&document).await?;
        self.locks.remove(&document_id);
        tracing::info!("Deleted document {} ('{}')", document_id, document.title);
        Ok(())
    }

    /// Remove a document's file, vectors, and record without state checks
    ///
    /// Used by the cleanup sweeper on stale failed documents.
    pub async fn purge(&self, document: &Document) -> Result<()> {
        if let Err(e) = self.files.delete(&document.source_uri).await {
            tracing::warn!(
                "Could not remove file {} for document {}: {}",
                document.source_uri.display(),
                document.id,
                e
            );
        }
        self.index.delete_by_document(document.id).await?;
        self.registry.remove(document.id).await?;
        Ok(())
    }
}
