//! Persistence layer: document records and uploaded file bytes

pub mod files;
pub mod registry;

pub use files::FileStore;
pub use registry::DocumentRegistry;
