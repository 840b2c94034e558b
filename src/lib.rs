//! doc-rag: RAG core with document ingestion, vector retrieval, and grounded answers
//!
//! This crate provides the core of a retrieval-augmented generation system:
//! an ingestion pipeline that moves documents through store/extract/chunk/
//! embed/index stages, a query engine that answers questions from retrieved
//! chunks with source attribution, and a background scheduler that bounds
//! ingestion concurrency and reclaims failed documents. HTTP routing, auth,
//! and heavyweight text-extraction codecs are external collaborators consumed
//! through the traits in [`providers`].

pub mod chat;
pub mod config;
pub mod context;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod processing;
pub mod providers;
pub mod retrieval;
pub mod storage;
pub mod types;

pub use config::RagConfig;
pub use context::AppContext;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Document, DocumentStatus, FileType, VectorRecord},
    query::{QueryRequest, QueryResponse},
    session::{ChatSession, Message, MessageRole, SourceDocument},
};
