//! Chat session store
//!
//! Sessions live in a `DashMap` and are persisted to a JSON file on every
//! mutation. Every operation takes the caller's user id; a session owned by
//! another user is indistinguishable from a missing one.

use dashmap::DashMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::types::{ChatSession, Message};

/// Store of chat sessions keyed by session id
pub struct SessionStore {
    sessions: DashMap<Uuid, ChatSession>,
    path: PathBuf,
}

impl SessionStore {
    /// Load sessions from disk, starting empty if the file is absent
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sessions = DashMap::new();

        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => {
                let records: Vec<ChatSession> = serde_json::from_str(&contents)?;
                let count = records.len();
                for session in records {
                    sessions.insert(session.id, session);
                }
                tracing::info!("Loaded {} chat sessions from {}", count, path.display());
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No session store at {}, starting empty", path.display());
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self { sessions, path })
    }

    async fn save(&self) -> Result<()> {
        let records: Vec<ChatSession> = self
            .sessions
            .iter()
            .map(|entry| entry.value().clone())
            .collect();

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&records)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }

    /// Create a new session for a user
    pub async fn create(&self, user_id: &str, title: Option<String>) -> Result<ChatSession> {
        let session = ChatSession::new(user_id, title);
        self.sessions.insert(session.id, session.clone());
        self.save().await?;
        tracing::info!("Created session {} for user {}", session.id, user_id);
        Ok(session)
    }

    /// Fetch a session, enforcing ownership
    pub fn get(&self, user_id: &str, session_id: Uuid) -> Result<ChatSession> {
        self.sessions
            .get(&session_id)
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .ok_or(Error::SessionNotFound(session_id))
    }

    /// List a user's sessions, most recently updated first
    pub fn list(&self, user_id: &str, skip: usize, limit: usize) -> Vec<ChatSession> {
        let mut sessions: Vec<ChatSession> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().user_id == user_id)
            .map(|entry| entry.value().clone())
            .collect();
        sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        sessions.into_iter().skip(skip).take(limit).collect()
    }

    /// Append messages to a session, bumping its updated timestamp
    pub async fn append(
        &self,
        user_id: &str,
        session_id: Uuid,
        messages: Vec<Message>,
    ) -> Result<ChatSession> {
        let updated = {
            let mut entry = self
                .sessions
                .get_mut(&session_id)
                .filter(|entry| entry.value().user_id == user_id)
                .ok_or(Error::SessionNotFound(session_id))?;
            let session = entry.value_mut();
            session.messages.extend(messages);
            session.updated_at = chrono::Utc::now();
            session.clone()
        };
        self.save().await?;
        Ok(updated)
    }

    /// Delete a session, enforcing ownership
    pub async fn delete(&self, user_id: &str, session_id: Uuid) -> Result<()> {
        let owned = self
            .sessions
            .get(&session_id)
            .map(|entry| entry.value().user_id == user_id)
            .unwrap_or(false);
        if !owned {
            return Err(Error::SessionNotFound(session_id));
        }
        self.sessions.remove(&session_id);
        self.save().await?;
        tracing::info!("Deleted session {} for user {}", session_id, user_id);
        Ok(())
    }
}
