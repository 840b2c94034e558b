//! Configuration for the RAG system

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main RAG system configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Storage paths
    #[serde(default)]
    pub storage: StorageConfig,
    /// Upload validation
    #[serde(default)]
    pub upload: UploadConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Embedding configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// LLM configuration
    #[serde(default)]
    pub llm: LlmConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Background processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// Cleanup sweep configuration
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self =
            toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(Error::Config("chunk_size must be positive".to_string()));
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.embedding.dimensions == 0 {
            return Err(Error::Config("embedding dimensions must be positive".to_string()));
        }
        if self.processing.workers == 0 {
            return Err(Error::Config("worker count must be positive".to_string()));
        }
        Ok(())
    }
}

/// Storage paths for uploaded files and persisted registries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for uploaded document files
    pub upload_dir: PathBuf,
    /// Path to the persisted document registry
    pub documents_path: PathBuf,
    /// Path to the persisted chat sessions
    pub sessions_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            upload_dir: data_dir.join("uploads"),
            documents_path: data_dir.join("documents.json"),
            sessions_path: data_dir.join("sessions.json"),
        }
    }
}

/// Upload validation limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum upload size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Allowed file extensions (lowercase, no dot)
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            allowed_extensions: vec![
                "txt".to_string(),
                "md".to_string(),
                "pdf".to_string(),
                "docx".to_string(),
            ],
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Embedding model name
    pub model: String,
    /// Embedding dimensions (1536 for OpenAI-style models)
    pub dimensions: usize,
    /// Number of texts embedded per parallel batch
    pub batch_size: usize,
    /// Maximum concurrent embedding requests
    pub max_parallel: usize,
    /// Timeout per embedding batch in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "nomic-embed-text".to_string(),
            dimensions: 1536,
            batch_size: 16,
            max_parallel: 4,
            timeout_secs: 60,
        }
    }
}

/// LLM configuration with an ordered fallback chain
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Base URL for the Ollama-compatible API
    pub base_url: String,
    /// Primary generation model
    pub model: String,
    /// Fallback models, tried in order when the primary fails
    #[serde(default)]
    pub fallback_models: Vec<String>,
    /// Prompt template name (see `generation::prompt`)
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Number of retries per model for transient failures
    pub max_retries: u32,
}

fn default_prompt_template() -> String {
    "chat_with_docs".to_string()
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            fallback_models: Vec::new(),
            prompt_template: default_prompt_template(),
            temperature: 0.3,
            max_tokens: 500,
            timeout_secs: 30,
            max_retries: 2,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks retrieved per query
    pub top_k: usize,
    /// Ceiling on the metadata-filtered scan used by delete-by-document
    pub delete_scan_limit: usize,
    /// Timeout per vector index call in seconds
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 3,
            delete_scan_limit: 10_000,
            timeout_secs: 30,
        }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Maximum concurrent ingestion jobs (default: 5, clamped by CPU count)
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the pending job queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    /// Timeout for a single ingestion attempt in seconds
    #[serde(default = "default_ingest_timeout")]
    pub ingest_timeout_secs: u64,
}

fn default_workers() -> usize {
    5
}
fn default_queue_capacity() -> usize {
    1000
}
fn default_ingest_timeout() -> u64 {
    300 // 5 minutes
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: default_queue_capacity(),
            ingest_timeout_secs: default_ingest_timeout(),
        }
    }
}

impl ProcessingConfig {
    /// Effective worker count, never exceeding available parallelism
    pub fn effective_workers(&self) -> usize {
        self.workers.min(num_cpus::get().max(1))
    }
}

/// Cleanup sweep configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Interval between sweeps in seconds (default: 24 hours)
    pub sweep_interval_secs: u64,
    /// How long a document may stay FAILED before it is purged, in days
    pub failed_retention_days: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: 86_400,
            failed_retention_days: 7,
        }
    }
}
