//! Attachment relay - content-addressed storage for supporting documents
//!
//! The engine only ever sees the returned reference string.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttachmentError {
    #[error("No file uploaded.")]
    Empty,

    #[error("Attachment not found: {0}")]
    NotFound(String),

    #[error("Invalid attachment reference: {0}")]
    InvalidReference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend for attachments
pub trait AttachmentStore: Send + Sync {
    /// Store a payload and return its reference
    fn put(&self, bytes: &[u8]) -> Result<String, AttachmentError>;

    /// Fetch a payload by reference
    fn get(&self, reference: &str) -> Result<Vec<u8>, AttachmentError>;
}

/// Files under a local directory, named by the SHA-256 of their content
pub struct LocalAttachmentStore {
    root: PathBuf,
}

impl LocalAttachmentStore {
    pub fn new(root: impl AsRef<Path>) -> Result<Self, AttachmentError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Reference a payload would be stored under
    pub fn reference_for(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    fn path_for(&self, reference: &str) -> Result<PathBuf, AttachmentError> {
        let valid = reference.len() == 64 && reference.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(AttachmentError::InvalidReference(reference.to_string()));
        }
        Ok(self.root.join(reference.to_ascii_lowercase()))
    }
}

impl AttachmentStore for LocalAttachmentStore {
    fn put(&self, bytes: &[u8]) -> Result<String, AttachmentError> {
        if bytes.is_empty() {
            return Err(AttachmentError::Empty);
        }

        let reference = Self::reference_for(bytes);
        let path = self.path_for(&reference)?;
        if !path.exists() {
            fs::write(&path, bytes)?;
            tracing::info!(reference = %reference, size = bytes.len(), "Attachment stored");
        }
        Ok(reference)
    }

    fn get(&self, reference: &str) -> Result<Vec<u8>, AttachmentError> {
        let path = self.path_for(reference)?;
        if !path.exists() {
            return Err(AttachmentError::NotFound(reference.to_string()));
        }
        Ok(fs::read(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_is_content_addressed() {
        let temp = TempDir::new().unwrap();
        let store = LocalAttachmentStore::new(temp.path()).unwrap();

        let first = store.put(b"invoice #42").unwrap();
        let again = store.put(b"invoice #42").unwrap();
        let other = store.put(b"invoice #43").unwrap();

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(first.len(), 64);
        assert_eq!(store.get(&first).unwrap(), b"invoice #42");
    }

    #[test]
    fn test_empty_payload_rejected() {
        let temp = TempDir::new().unwrap();
        let store = LocalAttachmentStore::new(temp.path()).unwrap();

        let err = store.put(&[]).unwrap_err();
        assert_eq!(err.to_string(), "No file uploaded.");
    }

    #[test]
    fn test_get_rejects_bad_references() {
        let temp = TempDir::new().unwrap();
        let store = LocalAttachmentStore::new(temp.path()).unwrap();

        assert!(matches!(
            store.get("../../etc/passwd"),
            Err(AttachmentError::InvalidReference(_))
        ));
        let missing = LocalAttachmentStore::reference_for(b"never stored");
        assert!(matches!(store.get(&missing), Err(AttachmentError::NotFound(_))));
    }
}
