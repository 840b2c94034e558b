//! Cleanup sweeper
//!
//! Periodically purges documents that have sat in the failed state past the
//! retention window, removing their file, vectors, and record.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::CleanupConfig;
use crate::ingestion::IngestionPipeline;
use crate::storage::DocumentRegistry;

/// Periodic purger of stale failed documents
pub struct CleanupSweeper {
    pipeline: Arc<IngestionPipeline>,
    registry: Arc<DocumentRegistry>,
    config: CleanupConfig,
    stop_tx: watch::Sender<bool>,
    handle: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl CleanupSweeper {
    pub fn new(
        pipeline: Arc<IngestionPipeline>,
        registry: Arc<DocumentRegistry>,
        config: CleanupConfig,
    ) -> Self {
        let (stop_tx, _) = watch::channel(false);
        Self {
            pipeline,
            registry,
            config,
            stop_tx,
            handle: parking_lot::Mutex::new(None),
        }
    }

    /// Spawn the periodic sweep task
    pub fn start(self: &Arc<Self>) {
        let sweeper = self.clone();
        let mut stop_rx = self.stop_tx.subscribe();
        let interval = Duration::from_secs(self.config.sweep_interval_secs);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // the immediate first tick would sweep at startup; skip it
            ticker.tick().await;
            tracing::info!(
                "Cleanup sweeper started, interval {}s, retention {} days",
                sweeper.config.sweep_interval_secs,
                sweeper.config.failed_retention_days
            );
            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {
                        let purged = sweeper.sweep_once().await;
                        if purged > 0 {
                            tracing::info!("Cleanup sweep purged {} documents", purged);
                        }
                    }
                }
            }
            tracing::info!("Cleanup sweeper stopped");
        });

        *self.handle.lock() = Some(handle);
    }

    /// Purge every document failed longer than the retention window,
    /// returning how many were removed
    ///
    /// Failures on one document are logged and do not stop the sweep.
    pub async fn sweep_once(&self) -> usize {
        let cutoff = chrono::Utc::now() - chrono::Duration::days(self.config.failed_retention_days);
        let stale = self.registry.failed_before(cutoff);

        let mut purged = 0;
        for document in stale {
            match self.pipeline.purge(&document).await {
                Ok(()) => {
                    tracing::info!(
                        "Purged stale failed document {} ('{}')",
                        document.id,
                        document.title
                    );
                    purged += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to purge document {}: {}", document.id, e);
                }
            }
        }
        purged
    }

    /// Stop the periodic task
    pub async fn stop(&self) {
        let _ = self.stop_tx.send(true);
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
