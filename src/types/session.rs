//! Chat session and message types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message author
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// A cited source for an assistant message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceDocument {
    /// Owning document id
    pub document_id: Uuid,
    /// Document title
    pub title: String,
    /// Excerpt of the retrieved chunk
    pub content_excerpt: String,
    /// Similarity score of the retrieved chunk (higher is more relevant)
    pub relevance_score: f32,
}

/// A single message in a chat session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Author role
    pub role: MessageRole,
    /// Message content
    pub content: String,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Sources cited by this message (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<SourceDocument>,
}

impl Message {
    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            created_at: chrono::Utc::now(),
            sources: Vec::new(),
        }
    }

    /// Create an assistant message with its sources
    pub fn assistant(content: impl Into<String>, sources: Vec<SourceDocument>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            created_at: chrono::Utc::now(),
            sources,
        }
    }

    /// Fallback assistant message appended when answer generation fails,
    /// so the user's turn is never silently lost
    pub fn fallback() -> Self {
        Self::assistant(
            "I apologize, but I encountered an error generating a response. \
             Please try again.",
            Vec::new(),
        )
    }
}

/// A persisted conversation between one user and the assistant
///
/// Messages are append-only: ordering is chronological and immutable once
/// appended. The whole session is replaced on save.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session ID
    pub id: Uuid,
    /// Owning user; enforced on every read/write
    pub user_id: String,
    /// Session title
    pub title: String,
    /// Ordered message history
    pub messages: Vec<Message>,
    /// Creation timestamp
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Last update timestamp (bumped on append)
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl ChatSession {
    /// Create a new empty session
    pub fn new(user_id: impl Into<String>, title: Option<String>) -> Self {
        let now = chrono::Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.into(),
            title: title.unwrap_or_else(|| "New Chat".to_string()),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
