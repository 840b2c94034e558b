//! Query boundary types consumed by an external HTTP/CLI layer

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::session::SourceDocument;

/// A question posed against the indexed documents
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// The user's message
    pub message: String,
    /// Existing session to continue, if any
    #[serde(default)]
    pub session_id: Option<Uuid>,
    /// Restrict retrieval to these documents
    #[serde(default)]
    pub document_filter: Option<Vec<Uuid>>,
    /// Override the configured number of retrieved chunks
    #[serde(default)]
    pub top_k: Option<usize>,
}

/// A grounded answer with its sources
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Answer content
    pub content: String,
    /// Sources in retrieval rank order; every entry corresponds to a chunk
    /// actually retrieved for this call
    pub sources: Vec<SourceDocument>,
    /// Session the exchange was appended to
    pub session_id: Uuid,
}
