//! Durable object store for relocated content.
//!
//! Objects live on the local filesystem under `{root}/{bucket}/{name}`
//! and are reachable through the configured public base URL. Deposits are
//! atomic: content is written to a temporary file in the destination
//! directory and renamed into place, so readers never observe a partial
//! object and repeated deposits of the same name collide safely.

use std::path::{Path, PathBuf};

use cachegate_core::{Error, Visibility};

/// Filesystem-backed destination namespace.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl ObjectStore {
    /// Open the object store, creating the bucket directory if needed.
    pub async fn open(
        root: impl Into<PathBuf>, bucket: impl Into<String>, public_base_url: impl Into<String>,
    ) -> Result<Self, Error> {
        let root = root.into();
        let bucket = bucket.into();
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();

        tokio::fs::create_dir_all(root.join(&bucket))
            .await
            .map_err(|e| Error::RelocateFailed(format!("failed to create object root: {e}")))?;

        Ok(Self { root, bucket, public_base_url })
    }

    /// Deposit an object under `name`, returning its public URL.
    ///
    /// `name` is a relative object key (e.g. `host/digest`); path
    /// components are created as needed. Existing objects are replaced.
    pub async fn deposit(&self, name: &str, bytes: &[u8], visibility: Visibility) -> Result<String, Error> {
        let path = self.object_path(name)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::RelocateFailed(format!("failed to create object dir: {e}")))?;
        }

        let tmp = path.with_extension("part");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| Error::RelocateFailed(format!("failed to write object: {e}")))?;

        #[cfg(unix)]
        if visibility == Visibility::Private {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(|e| Error::RelocateFailed(format!("failed to set object permissions: {e}")))?;
        }
        #[cfg(not(unix))]
        let _ = visibility;

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| Error::RelocateFailed(format!("failed to finalize object: {e}")))?;

        tracing::debug!(name, bytes = bytes.len(), "deposited object");

        Ok(format!("{}/{}/{}", self.public_base_url, self.bucket, name))
    }

    /// Absolute filesystem path for an object name.
    ///
    /// Rejects names that would escape the bucket directory.
    pub fn object_path(&self, name: &str) -> Result<PathBuf, Error> {
        if name.is_empty()
            || Path::new(name)
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        {
            return Err(Error::RelocateFailed(format!("invalid object name: {name:?}")));
        }
        Ok(self.root.join(&self.bucket).join(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn open_store(dir: &tempfile::TempDir) -> ObjectStore {
        ObjectStore::open(dir.path(), "test-bucket", "http://cdn.test/objects/")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_deposit_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        let url = store
            .deposit("example.com/abc123", b"payload", Visibility::Public)
            .await
            .unwrap();

        assert_eq!(url, "http://cdn.test/objects/test-bucket/example.com/abc123");

        let path = store.object_path("example.com/abc123").unwrap();
        let content = tokio::fs::read(&path).await.unwrap();
        assert_eq!(content, b"payload");
    }

    #[tokio::test]
    async fn test_deposit_replaces_existing() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        store.deposit("example.com/k", b"old", Visibility::Public).await.unwrap();
        store.deposit("example.com/k", b"new", Visibility::Public).await.unwrap();

        let path = store.object_path("example.com/k").unwrap();
        let content = tokio::fs::read(&path).await.unwrap();
        assert_eq!(content, b"new");
    }

    #[tokio::test]
    async fn test_deposit_leaves_no_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        store.deposit("example.com/k", b"data", Visibility::Public).await.unwrap();

        let part = store.object_path("example.com/k").unwrap().with_extension("part");
        assert!(!part.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_private_deposit_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        store.deposit("example.com/k", b"secret", Visibility::Private).await.unwrap();

        let path = store.object_path("example.com/k").unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[tokio::test]
    async fn test_object_name_traversal_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir).await;

        assert!(store.object_path("../escape").is_err());
        assert!(store.object_path("/abs/path").is_err());
        assert!(store.object_path("").is_err());
        assert!(store.object_path("./x").is_err());
    }
}
