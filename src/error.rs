//! Error types for the RAG system

use thiserror::Error;

/// Result type alias for RAG operations
pub type Result<T> = std::result::Result<T, Error>;

/// RAG system errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unsupported file type
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Uploaded file exceeds the configured size limit
    #[error("File size {size} bytes exceeds maximum of {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    /// Text extraction error
    #[error("Failed to extract text from '{title}': {message}")]
    Extraction { title: String, message: String },

    /// Embedding error
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    VectorIndex(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Document not found
    #[error("Document not found: {0}")]
    DocumentNotFound(uuid::Uuid),

    /// Session not found (or not owned by the caller)
    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    /// Invalid document lifecycle transition
    #[error("Invalid state for document {document_id}: expected {expected}, found {actual}")]
    InvalidState {
        document_id: uuid::Uuid,
        expected: crate::types::document::DocumentStatus,
        actual: crate::types::document::DocumentStatus,
    },

    /// External call exceeded its deadline
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an extraction error
    pub fn extraction(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            title: title.into(),
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector index error
    pub fn vector_index(message: impl Into<String>) -> Self {
        Self::VectorIndex(message.into())
    }

    /// Create an LLM error
    pub fn llm(message: impl Into<String>) -> Self {
        Self::Llm(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether a later retry of the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Embedding(_)
                | Self::VectorIndex(_)
                | Self::Llm(_)
                | Self::Timeout(_)
                | Self::Http(_)
        )
    }
}
