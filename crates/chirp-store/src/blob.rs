//! Blob storage for image attachments.
//!
//! Objects are grouped under one directory per username. Each object has an
//! internal key (used for deletion) and a public URL (used for display).

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

use crate::error::{Result, StoreError};

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    /// Internal object key, `<directory>/<object name>`.
    pub key: String,
    /// Public URL the object is served from.
    pub public_url: String,
}

/// Object storage for uploaded files.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `directory` and return its key and public URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the object cannot be written.
    async fn upload(&self, directory: &str, file_name: &str, data: Vec<u8>) -> Result<StoredBlob>;

    /// Delete an object. Deleting a missing object is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is invalid or the delete fails.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Create the directory marker for a namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the marker cannot be created.
    async fn create_directory(&self, name: &str) -> Result<()>;
}

/// Filesystem-backed blob store.
///
/// Objects live under `root`; the service exposes `root` at
/// `public_base_url`.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// Create a blob store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// The directory objects are stored under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a key to a path under the root, rejecting keys that would escape it.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let safe = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !safe {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{key}", self.public_base_url)
    }
}

/// Reduce an uploaded file name to a safe object name component.
///
/// Any directory part is dropped and characters outside
/// `[A-Za-z0-9._-]` are replaced with `_`.
#[must_use]
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, directory: &str, file_name: &str, data: Vec<u8>) -> Result<StoredBlob> {
        let object = format!("{}-{}", ulid::Ulid::new(), sanitize_file_name(file_name));
        let key = format!("{directory}/{object}");
        let path = self.resolve(&key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Blob(e.to_string()))?;
        }
        tokio::fs::write(&path, &data)
            .await
            .map_err(|e| StoreError::Blob(e.to_string()))?;

        tracing::debug!(key = %key, bytes = data.len(), "Stored blob");

        Ok(StoredBlob {
            public_url: self.public_url(&key),
            key,
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Deleted blob");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key = %key, "Blob already absent");
                Ok(())
            }
            Err(e) => Err(StoreError::Blob(e.to_string())),
        }
    }

    async fn create_directory(&self, name: &str) -> Result<()> {
        let path = self.resolve(name)?;
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|e| StoreError::Blob(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (FsBlobStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (FsBlobStore::new(dir.path(), "/media/"), dir)
    }

    #[tokio::test]
    async fn upload_and_delete() {
        let (blobs, _dir) = store();

        let stored = blobs.upload("bob", "cat.png", vec![1, 2, 3]).await.unwrap();
        assert!(stored.key.starts_with("bob/"));
        assert!(stored.key.ends_with("-cat.png"));
        assert_eq!(stored.public_url, format!("/media/{}", stored.key));

        let path = blobs.root().join(&stored.key);
        assert_eq!(std::fs::read(&path).unwrap(), vec![1, 2, 3]);

        blobs.delete(&stored.key).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn same_file_name_gets_distinct_keys() {
        let (blobs, _dir) = store();
        let a = blobs.upload("bob", "cat.png", vec![1]).await.unwrap();
        let b = blobs.upload("bob", "cat.png", vec![2]).await.unwrap();
        assert_ne!(a.key, b.key);
    }

    #[tokio::test]
    async fn deleting_missing_blob_is_noop() {
        let (blobs, _dir) = store();
        blobs.delete("bob/missing.png").await.unwrap();
    }

    #[tokio::test]
    async fn rejects_escaping_keys() {
        let (blobs, _dir) = store();
        let result = blobs.delete("../etc/passwd").await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
        let result = blobs.delete("/etc/passwd").await;
        assert!(matches!(result, Err(StoreError::InvalidKey(_))));
    }

    #[tokio::test]
    async fn directory_marker() {
        let (blobs, _dir) = store();
        blobs.create_directory("alice").await.unwrap();
        assert!(blobs.root().join("alice").is_dir());
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(sanitize_file_name("cat.png"), "cat.png");
        assert_eq!(sanitize_file_name("../../evil.sh"), "evil.sh");
        assert_eq!(sanitize_file_name("C:\\photos\\my cat.jpg"), "my_cat.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
    }
}
