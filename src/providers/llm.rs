//! LLM provider trait

use async_trait::async_trait;

use crate::error::Result;

/// Sampling parameters for a generation call
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Sampling temperature
    pub temperature: f32,
    /// Maximum tokens to generate
    pub max_tokens: usize,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

/// Trait for LLM-based text generation
///
/// The query engine holds an ordered chain of these and exhausts it before
/// surfacing an error.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a completion for the given prompt
    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier
    fn model(&self) -> &str;
}
