//! Retrieval layer over the vector index

pub mod index;

pub use index::VectorIndex;
