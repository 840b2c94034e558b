//! Document lifecycle types, chunks, and vector records

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use uuid::Uuid;

/// Supported file types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Plain text file
    Txt,
    /// Markdown file
    Markdown,
    /// PDF document
    Pdf,
    /// Microsoft Word document (.docx)
    Docx,
    /// Unknown file type
    Unknown,
}

impl FileType {
    /// Detect file type from extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" | "text" => Self::Txt,
            "md" | "markdown" => Self::Markdown,
            "pdf" => Self::Pdf,
            "docx" => Self::Docx,
            _ => Self::Unknown,
        }
    }

    /// Detect file type from a filename
    pub fn from_filename(filename: &str) -> Self {
        filename
            .rsplit('.')
            .next()
            .filter(|ext| *ext != filename)
            .map(Self::from_extension)
            .unwrap_or(Self::Unknown)
    }

    /// Canonical file extension for stored files
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Txt => "txt",
            Self::Markdown => "md",
            Self::Pdf => "pdf",
            Self::Docx => "docx",
            Self::Unknown => "bin",
        }
    }

    /// MIME content type used at the extraction boundary
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Txt => "text/plain",
            Self::Markdown => "text/markdown",
            Self::Pdf => "application/pdf",
            Self::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            Self::Unknown => "application/octet-stream",
        }
    }
}

/// Document processing status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Created, waiting for a worker to pick it up
    Pending,
    /// A worker is ingesting this document
    Processing,
    /// Chunks are indexed and retrievable
    Completed,
    /// Ingestion failed; recoverable via explicit retry
    Failed,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// An ingested document
///
/// Status is the single source of truth for where the document is in its
/// lifecycle. `vector_ids` is non-empty iff status is `Completed`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded
    pub title: String,
    /// Path of the stored file
    pub source_uri: PathBuf,
    /// File type
    pub file_type: FileType,
    /// Content hash for deduplication
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Processing status
    pub status: DocumentStatus,
    /// Ids of indexed vectors (set on completion)
    pub vector_ids: Vec<String>,
    /// Error message from the last failed attempt
    pub error: Option<String>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last update timestamp
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new pending document
    pub fn new(
        title: String,
        source_uri: PathBuf,
        file_type: FileType,
        content_hash: String,
        file_size: u64,
    ) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            source_uri,
            file_type,
            content_hash,
            file_size,
            status: DocumentStatus::Pending,
            vector_ids: Vec::new(),
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A chunk of a document's text
///
/// Ephemeral: produced and consumed within one ingestion attempt. `index` is
/// 0-based and dense; ordering is significant for citation locality.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Parent document ID
    pub document_id: Uuid,
    /// Chunk index within the document
    pub index: u32,
    /// Text content
    pub text: String,
    /// Character span in the extracted text
    pub char_start: usize,
    pub char_end: usize,
}

impl Chunk {
    /// Stable vector id for this chunk, idempotent across retries
    pub fn vector_id(&self) -> String {
        format!("{}:{}", self.document_id, self.index)
    }

    /// First `max` characters of the chunk, for citation excerpts
    pub fn preview(&self, max: usize) -> String {
        self.text.chars().take(max).collect()
    }
}

/// A vector with its metadata, as stored in the vector index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Unique vector ID (stable per document/chunk pair)
    pub vector_id: String,
    /// Embedding vector
    pub embedding: Vec<f32>,
    /// String metadata, usable as equality filters at query time
    pub metadata: HashMap<String, String>,
}

impl VectorRecord {
    /// Metadata key holding the owning document id
    pub const DOCUMENT_ID: &'static str = "document_id";
    /// Metadata key holding the chunk index
    pub const CHUNK_INDEX: &'static str = "chunk_index";
    /// Metadata key holding the document title
    pub const TITLE: &'static str = "title";
    /// Metadata key holding the chunk text preview
    pub const TEXT_PREVIEW: &'static str = "text_preview";

    /// Build a record from a chunk and its embedding
    pub fn from_chunk(chunk: &Chunk, embedding: Vec<f32>, title: &str) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(Self::DOCUMENT_ID.to_string(), chunk.document_id.to_string());
        metadata.insert(Self::CHUNK_INDEX.to_string(), chunk.index.to_string());
        metadata.insert(Self::TITLE.to_string(), title.to_string());
        metadata.insert(Self::TEXT_PREVIEW.to_string(), chunk.preview(200));
        Self {
            vector_id: chunk.vector_id(),
            embedding,
            metadata,
        }
    }

    /// Owning document id, if present in metadata
    pub fn document_id(&self) -> Option<Uuid> {
        self.metadata
            .get(Self::DOCUMENT_ID)
            .and_then(|s| Uuid::parse_str(s).ok())
    }

    /// Document title, if present in metadata
    pub fn title(&self) -> &str {
        self.metadata
            .get(Self::TITLE)
            .map(String::as_str)
            .unwrap_or("unknown")
    }

    /// Chunk text preview, if present in metadata
    pub fn text_preview(&self) -> &str {
        self.metadata
            .get(Self::TEXT_PREVIEW)
            .map(String::as_str)
            .unwrap_or("")
    }
}
