//! Uploaded file storage
//!
//! Files are written under the upload directory named by document id, so a
//! record always points at exactly one file and deletes cannot race renames.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::Result;
use crate::types::FileType;

/// Stores raw uploaded bytes on the local filesystem
pub struct FileStore {
    upload_dir: PathBuf,
}

impl FileStore {
    pub fn new(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            upload_dir: upload_dir.into(),
        }
    }

    /// Ensure the upload directory exists
    pub async fn init(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.upload_dir).await?;
        Ok(())
    }

    /// Path where a document's bytes live
    pub fn path_for(&self, document_id: Uuid, file_type: FileType) -> PathBuf {
        self.upload_dir
            .join(format!("{}.{}", document_id, file_type.extension()))
    }

    /// Write uploaded bytes, returning the stored path
    pub async fn save(
        &self,
        document_id: Uuid,
        file_type: FileType,
        bytes: &[u8],
    ) -> Result<PathBuf> {
        let path = self.path_for(document_id, file_type);
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(path)
    }

    /// Read a document's bytes back
    pub async fn read(&self, path: &Path) -> Result<Vec<u8>> {
        Ok(tokio::fs::read(path).await?)
    }

    /// Delete a stored file; missing files are not an error
    pub async fn delete(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("File already gone: {}", path.display());
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_read_delete_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        store.init().await.unwrap();

        let id = Uuid::new_v4();
        let path = store.save(id, FileType::Txt, b"contents").await.unwrap();
        assert_eq!(store.read(&path).await.unwrap(), b"contents");

        store.delete(&path).await.unwrap();
        assert!(store.read(&path).await.is_err());
        // second delete is a no-op
        store.delete(&path).await.unwrap();
    }
}
