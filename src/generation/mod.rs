//! Prompt construction and answer generation

pub mod engine;
pub mod prompt;

pub use engine::{Answer, RagEngine};
pub use prompt::{ContextBlock, PromptBuilder};
