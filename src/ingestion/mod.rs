//! Document ingestion: validation, chunking, and the indexing pipeline

pub mod chunker;
pub mod pipeline;

pub use chunker::Chunker;
pub use pipeline::IngestionPipeline;
