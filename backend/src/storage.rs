//! Content-addressed storage for paper files
//!
//! Files live under `<data_dir>/papers/<sha256 hex>`. Writing the same bytes
//! twice yields the same digest and a single file.

use std::io;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use shared::is_valid_digest;
use tokio::fs;

/// Paper file store rooted in the application data directory
#[derive(Debug, Clone)]
pub struct PaperStore {
    root: PathBuf,
}

impl PaperStore {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            root: data_dir.as_ref().join("papers"),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the store directory if needed
    pub async fn init(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// SHA-256 of `bytes` as lowercase hex
    pub fn digest(bytes: &[u8]) -> String {
        hex::encode(Sha256::digest(bytes))
    }

    /// Store `bytes`, returning their digest
    pub async fn put(&self, bytes: &[u8]) -> io::Result<String> {
        let digest = Self::digest(bytes);
        let path = self.path_for(&digest)?;

        if fs::try_exists(&path).await? {
            return Ok(digest);
        }

        fs::create_dir_all(&self.root).await?;
        // Write under a temporary name, then rename into place
        let tmp = self.root.join(format!(".{}.{}", digest, uuid::Uuid::new_v4()));
        fs::write(&tmp, bytes).await?;
        if let Err(e) = fs::rename(&tmp, &path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e);
        }

        tracing::debug!(%digest, size = bytes.len(), "Stored paper file");
        Ok(digest)
    }

    /// Read the file with the given digest
    pub async fn read(&self, digest: &str) -> io::Result<Vec<u8>> {
        fs::read(self.path_for(digest)?).await
    }

    /// Remove the file with the given digest. A missing file is not an error.
    pub async fn remove(&self, digest: &str) -> io::Result<()> {
        match fs::remove_file(self.path_for(digest)?).await {
            Ok(()) => {
                tracing::debug!(%digest, "Removed paper file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn path_for(&self, digest: &str) -> io::Result<PathBuf> {
        if !is_valid_digest(digest) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file digest: {:?}", digest),
            ));
        }
        Ok(self.root.join(digest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path());
        store.init().await.unwrap();

        let digest = store.put(b"%PDF-1.4 hello").await.unwrap();
        assert_eq!(digest, PaperStore::digest(b"%PDF-1.4 hello"));
        assert_eq!(store.read(&digest).await.unwrap(), b"%PDF-1.4 hello");

        store.remove(&digest).await.unwrap();
        assert!(store.read(&digest).await.is_err());
        // Second removal is a no-op
        store.remove(&digest).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path());

        let a = store.put(b"same").await.unwrap();
        let b = store.put(b"same").await.unwrap();
        assert_eq!(a, b);

        let entries = std::fs::read_dir(store.root()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_rejects_bad_digest() {
        let dir = tempfile::tempdir().unwrap();
        let store = PaperStore::new(dir.path());
        let err = store.read("../secret").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_digest_of_empty_input() {
        assert_eq!(
            PaperStore::digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
