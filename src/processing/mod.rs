//! Background processing: the ingestion worker pool and the cleanup sweeper

pub mod queue;
pub mod sweeper;

pub use queue::{IngestionJob, WorkerPool};
pub use sweeper::CleanupSweeper;
