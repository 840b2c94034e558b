//! Ingestion worker pool
//!
//! A bounded FIFO queue feeding a dispatcher task. The dispatcher admits at
//! most `workers` concurrent ingestion jobs via a semaphore; enqueue awaits
//! when the queue is full, giving callers natural backpressure. Stopping is
//! graceful: in-flight jobs run to completion, queued jobs are dropped and
//! their documents stay pending.

use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ProcessingConfig;
use crate::error::{Error, Result};
use crate::ingestion::IngestionPipeline;

/// A queued ingestion request
#[derive(Debug, Clone)]
pub struct IngestionJob {
    pub document_id: Uuid,
    pub enqueued_at: chrono::DateTime<chrono::Utc>,
}

impl IngestionJob {
    pub fn new(document_id: Uuid) -> Self {
        Self {
            document_id,
            enqueued_at: chrono::Utc::now(),
        }
    }
}

/// Bounded pool of ingestion workers
pub struct WorkerPool {
    sender: mpsc::Sender<IngestionJob>,
    queue_capacity: usize,
    workers: usize,
    semaphore: Arc<Semaphore>,
    stop_tx: watch::Sender<bool>,
    dispatcher: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start the pool's dispatcher task
    pub fn start(pipeline: Arc<IngestionPipeline>, config: &ProcessingConfig) -> Self {
        let workers = config.effective_workers();
        let queue_capacity = config.queue_capacity.max(1);
        let (sender, mut receiver) = mpsc::channel::<IngestionJob>(queue_capacity);
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let semaphore = Arc::new(Semaphore::new(workers));

        let dispatch_semaphore = semaphore.clone();
        let dispatcher = tokio::spawn(async move {
            tracing::info!("Worker pool started with {} workers", workers);
            loop {
                let job = tokio::select! {
                    _ = stop_rx.changed() => break,
                    job = receiver.recv() => match job {
                        Some(job) => job,
                        None => break,
                    },
                };

                // stop means "finish in-flight, start nothing new": a job
                // already dequeued is abandoned here and its document stays
                // pending
                let permit = tokio::select! {
                    _ = stop_rx.changed() => break,
                    permit = dispatch_semaphore.clone().acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };

                let pipeline = pipeline.clone();
                tokio::spawn(async move {
                    let wait = chrono::Utc::now() - job.enqueued_at;
                    tracing::debug!(
                        "Picked up document {} after {}ms in queue",
                        job.document_id,
                        wait.num_milliseconds()
                    );
                    // ingest records failure on the document itself
                    let _ = pipeline.ingest(job.document_id).await;
                    drop(permit);
                });
            }
            tracing::info!("Worker pool dispatcher stopped");
        });

        Self {
            sender,
            queue_capacity,
            workers,
            semaphore,
            stop_tx,
            dispatcher: parking_lot::Mutex::new(Some(dispatcher)),
        }
    }

    /// Enqueue a document for ingestion, awaiting if the queue is full
    pub async fn enqueue(&self, document_id: Uuid) -> Result<()> {
        self.sender
            .send(IngestionJob::new(document_id))
            .await
            .map_err(|_| Error::internal("worker pool is stopped"))?;
        tracing::debug!("Enqueued document {} for ingestion", document_id);
        Ok(())
    }

    /// Jobs waiting in the queue (excludes in-flight jobs)
    pub fn queue_depth(&self) -> usize {
        self.queue_capacity - self.sender.capacity()
    }

    /// Jobs currently being ingested
    pub fn active_jobs(&self) -> usize {
        self.workers - self.semaphore.available_permits()
    }

    /// Stop accepting work and wait for in-flight jobs to finish
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(true);

        let handle = self.dispatcher.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        // all permits back means all in-flight jobs are done
        let _ = self.semaphore.acquire_many(self.workers as u32).await;
        tracing::info!("Worker pool drained");
    }
}
