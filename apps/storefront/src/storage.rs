//! # Proof Storage
//!
//! Where uploaded payment proofs go. The order only keeps the returned URL.

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Proof file is empty")]
    EmptyFile,

    #[error("Invalid proof file name: {0}")]
    InvalidName(String),

    #[error("Failed to store proof: {0}")]
    Io(#[from] std::io::Error),
}

/// Stores a proof of payment and returns its public URL.
#[async_trait]
pub trait ProofStorage: Send + Sync {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// Writes proofs into a local directory.
///
/// Files are named `{uuid}-{file_name}` so repeated uploads never collide.
pub struct LocalProofStorage {
    dir: PathBuf,
    public_base_url: String,
}

impl LocalProofStorage {
    /// With no `public_base_url`, URLs point at the directory itself.
    pub fn new(dir: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        let dir = dir.into();
        let public_base_url = public_base_url
            .unwrap_or_else(|| format!("file://{}", dir.display()))
            .trim_end_matches('/')
            .to_string();
        LocalProofStorage {
            dir,
            public_base_url,
        }
    }

    /// Keeps ASCII alphanumerics, `.`, `-` and `_` of the last path segment.
    fn sanitize(file_name: &str) -> Result<String, StorageError> {
        let base = file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default();

        let cleaned: String = base
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();

        if cleaned.trim_matches(['.', '_']).is_empty() {
            return Err(StorageError::InvalidName(file_name.to_string()));
        }
        Ok(cleaned)
    }
}

#[async_trait]
impl ProofStorage for LocalProofStorage {
    async fn upload(&self, file_name: &str, bytes: &[u8]) -> Result<String, StorageError> {
        if bytes.is_empty() {
            return Err(StorageError::EmptyFile);
        }

        let stored_name = format!("{}-{}", Uuid::new_v4(), Self::sanitize(file_name)?);
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&stored_name), bytes).await?;

        info!(file = %stored_name, size = bytes.len(), "Proof stored");
        Ok(format!("{}/{}", self.public_base_url, stored_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upload_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalProofStorage::new(
            dir.path().join("proofs"),
            Some("https://cdn.example.com/proofs/".into()),
        );

        let url = storage.upload("receipt.png", b"png-bytes").await.unwrap();
        assert!(url.starts_with("https://cdn.example.com/proofs/"));
        assert!(url.ends_with("-receipt.png"));

        let stored = url.rsplit('/').next().unwrap();
        let contents = std::fs::read(dir.path().join("proofs").join(stored)).unwrap();
        assert_eq!(contents, b"png-bytes");
    }

    #[tokio::test]
    async fn test_empty_upload_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalProofStorage::new(dir.path(), None);
        assert!(matches!(
            storage.upload("receipt.png", b"").await,
            Err(StorageError::EmptyFile)
        ));
    }

    #[test]
    fn test_sanitize() {
        assert_eq!(
            LocalProofStorage::sanitize("../../etc/pass wd.jpg").unwrap(),
            "pass_wd.jpg"
        );
        assert_eq!(
            LocalProofStorage::sanitize("C:\\scans\\bank.pdf").unwrap(),
            "bank.pdf"
        );
        assert!(LocalProofStorage::sanitize("..").is_err());
        assert!(LocalProofStorage::sanitize("dir/").is_err());
    }
}
