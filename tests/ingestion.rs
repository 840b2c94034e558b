//! Ingestion lifecycle: upload validation, chunking/indexing, failure,
//! retry, and deletion

mod common;

use std::sync::atomic::Ordering;

use doc_rag::{DocumentStatus, Error};

use common::Harness;

const ARTICLE: &str = "Quantum computing uses qubits instead of classical bits. \
A qubit can be in a superposition of both states at once.\n\n\
Entanglement links qubits so that measuring one constrains the other. \
This is the basis of quantum speedups for certain problems.\n\n\
Decoherence is the main engineering obstacle: interaction with the \
environment collapses the quantum state before the computation finishes.";

#[tokio::test]
async fn upload_and_ingest_completes_with_vectors() {
    let h = Harness::new().await;

    let doc = h
        .ctx
        .pipeline
        .create_document("quantum.txt", ARTICLE.as_bytes())
        .await
        .unwrap();
    assert_eq!(doc.status, DocumentStatus::Pending);
    assert!(doc.vector_ids.is_empty());

    let doc = h.ctx.pipeline.ingest(doc.id).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::Completed);
    assert!(!doc.vector_ids.is_empty());
    assert!(doc.error.is_none());

    // one vector per chunk, all under this document's id
    let indexed = h.ctx.engine.answer("quantum", &[], None, Some(50)).await;
    assert!(indexed.is_ok());
    for vector_id in &doc.vector_ids {
        assert!(vector_id.starts_with(&doc.id.to_string()));
    }

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn unsupported_extension_leaves_no_state() {
    let h = Harness::new().await;

    let err = h
        .ctx
        .pipeline
        .create_document("payload.exe", b"MZ")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedFileType(_)));
    assert!(h.ctx.registry.is_empty());

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let h = Harness::new().await;

    let too_big = vec![b'a'; (h.ctx.config.upload.max_file_size + 1) as usize];
    let err = h
        .ctx
        .pipeline
        .create_document("big.txt", &too_big)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::FileTooLarge { .. }));
    assert!(h.ctx.registry.is_empty());

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn duplicate_upload_returns_existing_document() {
    let h = Harness::new().await;

    let first = h
        .ctx
        .pipeline
        .create_document("a.txt", ARTICLE.as_bytes())
        .await
        .unwrap();
    let second = h
        .ctx
        .pipeline
        .create_document("b.txt", ARTICLE.as_bytes())
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(h.ctx.registry.len(), 1);

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn embedding_outage_marks_document_failed() {
    let h = Harness::new().await;
    h.embed_fail.store(true, Ordering::SeqCst);

    let doc = h
        .ctx
        .pipeline
        .create_document("quantum.txt", ARTICLE.as_bytes())
        .await
        .unwrap();
    let err = h.ctx.pipeline.ingest(doc.id).await.unwrap_err();
    assert!(err.is_retryable());

    let doc = h.ctx.registry.get(doc.id).unwrap();
    assert_eq!(doc.status, DocumentStatus::Failed);
    assert!(doc.vector_ids.is_empty());
    assert!(doc.error.is_some());

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn retry_after_recovery_completes_without_duplicates() {
    let h = Harness::new().await;

    // first attempt fails after chunking
    h.embed_fail.store(true, Ordering::SeqCst);
    let doc = h
        .ctx
        .pipeline
        .create_document("quantum.txt", ARTICLE.as_bytes())
        .await
        .unwrap();
    h.ctx.pipeline.ingest(doc.id).await.unwrap_err();

    // provider recovers, retry moves the document back to pending
    h.embed_fail.store(false, Ordering::SeqCst);
    let doc = h.ctx.pipeline.retry(doc.id).await.unwrap();
    assert_eq!(doc.status, DocumentStatus::Pending);

    let completed = h.ctx.pipeline.ingest(doc.id).await.unwrap();
    assert_eq!(completed.status, DocumentStatus::Completed);

    // ingest the same content into a fresh context to know the expected count
    let reference = Harness::new().await;
    let expected = reference.ingest_text("quantum.txt", ARTICLE).await;
    assert_eq!(completed.vector_ids.len(), expected.vector_ids.len());
    reference.ctx.shutdown().await;

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn retry_of_non_failed_document_is_rejected() {
    let h = Harness::new().await;

    let doc = h.ingest_text("quantum.txt", ARTICLE).await;
    let err = h.ctx.pipeline.retry(doc.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn whitespace_only_document_fails_extraction() {
    let h = Harness::new().await;

    let doc = h
        .ctx
        .pipeline
        .create_document("blank.txt", b"   \n\n   ")
        .await
        .unwrap();
    let err = h.ctx.pipeline.ingest(doc.id).await.unwrap_err();
    assert!(matches!(err, Error::Extraction { .. }));

    let doc = h.ctx.registry.get(doc.id).unwrap();
    assert_eq!(doc.status, DocumentStatus::Failed);

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn delete_removes_record_file_and_vectors() {
    let h = Harness::new().await;

    let doc = h.ingest_text("quantum.txt", ARTICLE).await;
    let path = doc.source_uri.clone();
    assert!(path.exists());

    h.ctx.pipeline.delete(doc.id).await.unwrap();

    assert!(matches!(
        h.ctx.registry.get(doc.id).unwrap_err(),
        Error::DocumentNotFound(_)
    ));
    assert!(!path.exists());
    // the document's vectors are gone: a broad search returns nothing
    let answer = h.ctx.engine.answer("quantum", &[], None, Some(50)).await.unwrap();
    assert!(answer.sources.is_empty());

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn delete_while_processing_is_rejected() {
    let h = Harness::new().await;

    let doc = h
        .ctx
        .pipeline
        .create_document("quantum.txt", ARTICLE.as_bytes())
        .await
        .unwrap();
    // claim the document as a worker would
    h.ctx.registry.begin_processing(doc.id).await.unwrap();

    let err = h.ctx.pipeline.delete(doc.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn concurrent_retries_serialize_to_one_winner() {
    let h = Harness::new().await;

    h.embed_fail.store(true, Ordering::SeqCst);
    let doc = h
        .ctx
        .pipeline
        .create_document("quantum.txt", ARTICLE.as_bytes())
        .await
        .unwrap();
    h.ctx.pipeline.ingest(doc.id).await.unwrap_err();
    h.embed_fail.store(false, Ordering::SeqCst);

    let a = {
        let ctx = h.ctx.clone();
        tokio::spawn(async move { ctx.pipeline.retry(doc.id).await })
    };
    let b = {
        let ctx = h.ctx.clone();
        tokio::spawn(async move { ctx.pipeline.retry(doc.id).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for result in &results {
        if let Err(e) = result {
            assert!(matches!(e, Error::InvalidState { .. }));
        }
    }

    let doc = h.ctx.registry.get(doc.id).unwrap();
    assert_eq!(doc.status, DocumentStatus::Pending);

    h.ctx.shutdown().await;
}

#[tokio::test]
async fn second_ingest_of_completed_document_is_rejected() {
    let h = Harness::new().await;

    let doc = h.ingest_text("quantum.txt", ARTICLE).await;
    let err = h.ctx.pipeline.ingest(doc.id).await.unwrap_err();
    assert!(matches!(err, Error::InvalidState { .. }));

    // status is untouched by the rejected attempt
    let doc = h.ctx.registry.get(doc.id).unwrap();
    assert_eq!(doc.status, DocumentStatus::Completed);

    h.ctx.shutdown().await;
}
