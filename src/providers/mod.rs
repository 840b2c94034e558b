//! Provider abstractions for embeddings, LLM, vector storage, and text extraction
//!
//! These trait seams let the core swap between local (Ollama + in-memory
//! index) and external backends, and let tests inject deterministic doubles
//! without touching shared globals.

pub mod embedding;
pub mod extract;
pub mod llm;
pub mod memory;
pub mod ollama;
pub mod vector_index;

pub use embedding::EmbeddingProvider;
pub use extract::{PlainTextExtractor, TextExtractor};
pub use llm::{GenerationParams, LlmProvider};
pub use memory::MemoryVectorIndex;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use vector_index::{VectorIndexProvider, VectorMatch};
