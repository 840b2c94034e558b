//! Conversation sessions and the chat-facing query service

pub mod service;
pub mod store;

pub use service::ChatService;
pub use store::SessionStore;
