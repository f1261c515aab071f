/// Uploaded file storage
///
/// Profile images are written through a [`FileStore`], which returns the public
/// URI stored on the user row. Replacing or deleting an image removes the old
/// file best-effort: failures are logged with [`discard`] and never propagated.
///
/// # Example
///
/// ```no_run
/// use taskhub_shared::storage::{FileStore, LocalFileStore};
/// use bytes::Bytes;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = LocalFileStore::new("uploads", "http://localhost:8080/uploads", 5 * 1024 * 1024);
/// let uri = store.save("image/png", Bytes::from_static(b"\x89PNG...")).await?;
/// store.delete(&uri).await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Error type for file storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("File is too large: {size} bytes, limit is {limit} bytes")]
    TooLarge { size: usize, limit: usize },

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Storage backend for uploaded images
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Stores `data` and returns its public URI
    async fn save(&self, content_type: &str, data: Bytes) -> Result<String, StorageError>;

    /// Removes the file behind `uri`
    ///
    /// URIs this store did not issue are ignored.
    async fn delete(&self, uri: &str) -> Result<(), StorageError>;
}

/// Maps an accepted image content type to a file extension
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

/// Local filesystem store
///
/// Files land under `root` with random names and are published at
/// `{public_base_url}/{file_name}`.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalFileStore {
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
        max_bytes: usize,
    ) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a URI issued by this store to its path on disk
    fn path_for(&self, uri: &str) -> Option<PathBuf> {
        let name = uri
            .strip_prefix(&self.public_base_url)?
            .strip_prefix('/')?;

        let is_plain_name = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.');

        is_plain_name.then(|| self.root.join(name))
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn save(&self, content_type: &str, data: Bytes) -> Result<String, StorageError> {
        let extension = image_extension(content_type)
            .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))?;

        if data.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: data.len(),
                limit: self.max_bytes,
            });
        }

        tokio::fs::create_dir_all(&self.root).await?;

        let file_name = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(self.root.join(&file_name), &data).await?;

        tracing::debug!(file = %file_name, bytes = data.len(), "Stored upload");

        Ok(format!("{}/{}", self.public_base_url, file_name))
    }

    async fn delete(&self, uri: &str) -> Result<(), StorageError> {
        let Some(path) = self.path_for(uri) else {
            tracing::debug!(uri, "Ignoring delete of foreign upload URI");
            return Ok(());
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Deletes a stored file, logging instead of failing
pub async fn discard(store: &dyn FileStore, uri: &str) {
    if let Err(e) = store.delete(uri).await {
        tracing::warn!(uri, error = %e, "Failed to delete stored file");
    }
}
