//! Typed records for documents, chunks, vectors, sessions, and queries

pub mod document;
pub mod query;
pub mod session;

pub use document::{Chunk, Document, DocumentStatus, FileType, VectorRecord};
pub use query::{QueryRequest, QueryResponse};
pub use session::{ChatSession, Message, MessageRole, SourceDocument};
