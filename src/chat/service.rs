//! Chat service
//!
//! Binds the query engine to session persistence. The user's turn is always
//! recorded: if answer generation fails after retrieval, a marked fallback
//! assistant message is appended instead of dropping the exchange.

use std::sync::Arc;
use uuid::Uuid;

use crate::chat::SessionStore;
use crate::error::Result;
use crate::generation::RagEngine;
use crate::types::{ChatSession, Message, QueryRequest, QueryResponse};

/// Conversation-aware query front end
pub struct ChatService {
    engine: Arc<RagEngine>,
    sessions: Arc<SessionStore>,
}

impl ChatService {
    pub fn new(engine: Arc<RagEngine>, sessions: Arc<SessionStore>) -> Self {
        Self { engine, sessions }
    }

    /// Answer a user's message within a session
    ///
    /// Resolves or creates the session, runs the RAG engine with the session
    /// history, and appends both turns atomically from the caller's view.
    pub async fn process_message(
        &self,
        user_id: &str,
        request: &QueryRequest,
    ) -> Result<QueryResponse> {
        let session = match request.session_id {
            Some(id) => self.sessions.get(user_id, id)?,
            None => {
                let title = Self::title_from(&request.message);
                self.sessions.create(user_id, Some(title)).await?
            }
        };

        let outcome = self
            .engine
            .answer(
                &request.message,
                &session.messages,
                request.document_filter.as_deref(),
                request.top_k,
            )
            .await;

        let (assistant, result) = match outcome {
            Ok(answer) => {
                let message = Message::assistant(answer.content.clone(), answer.sources.clone());
                let response = QueryResponse {
                    content: answer.content,
                    sources: answer.sources,
                    session_id: session.id,
                };
                (message, Ok(response))
            }
            Err(e) => {
                tracing::error!("Answer generation failed for session {}: {}", session.id, e);
                let message = Message::fallback();
                let response = QueryResponse {
                    content: message.content.clone(),
                    sources: Vec::new(),
                    session_id: session.id,
                };
                (message, Ok(response))
            }
        };

        self.sessions
            .append(
                user_id,
                session.id,
                vec![Message::user(request.message.clone()), assistant],
            )
            .await?;

        result
    }

    /// Create an empty session
    pub async fn create_session(
        &self,
        user_id: &str,
        title: Option<String>,
    ) -> Result<ChatSession> {
        self.sessions.create(user_id, title).await
    }

    /// Fetch a session with its history
    pub fn get_session(&self, user_id: &str, session_id: Uuid) -> Result<ChatSession> {
        self.sessions.get(user_id, session_id)
    }

    /// List the user's sessions, newest activity first
    pub fn list_sessions(&self, user_id: &str, skip: usize, limit: usize) -> Vec<ChatSession> {
        self.sessions.list(user_id, skip, limit)
    }

    /// Delete a session
    pub async fn delete_session(&self, user_id: &str, session_id: Uuid) -> Result<()> {
        self.sessions.delete(user_id, session_id).await
    }

    /// Derive a session title from the first message
    fn title_from(message: &str) -> String {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return "New Chat".to_string();
        }
        let title: String = trimmed.chars().take(50).collect();
        if trimmed.chars().count() > 50 {
            format!("{}...", title)
        } else {
            title
        }
    }
}
