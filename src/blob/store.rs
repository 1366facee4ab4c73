use async_trait::async_trait;
use axum::body::Bytes;
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::shared::AppError;

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BlobError> for AppError {
    fn from(e: BlobError) -> Self {
        AppError::StorageError(e.to_string())
    }
}

/// External object storage for attachments
#[async_trait]
pub trait BlobStore {
    /// Stores `bytes` and returns the URL clients fetch them from
    async fn put(&self, bytes: Bytes, mime_type: &str) -> Result<String, BlobError>;
}

/// Writes blobs under a local directory, served back at `{public_url}/files/{id}`
pub struct LocalBlobStore {
    root: PathBuf,
    public_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    async fn put(&self, bytes: Bytes, mime_type: &str) -> Result<String, BlobError> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            error!(root = ?self.root, error = %e, "Failed to create upload directory");
            e
        })?;

        let blob_id = Uuid::new_v4().to_string();
        let path = self.root.join(&blob_id);

        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        debug!(blob_id = %blob_id, mime_type = %mime_type, "Blob written to disk");
        Ok(format!("{}/files/{}", self.public_url, blob_id))
    }
}

/// Keeps blobs in memory; for tests and local runs without a disk
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, (String, Bytes)>>,
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    pub async fn blob_count(&self) -> usize {
        self.blobs.read().await.len()
    }

    pub async fn get(&self, url: &str) -> Option<(String, Bytes)> {
        self.blobs.read().await.get(url).cloned()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, bytes: Bytes, mime_type: &str) -> Result<String, BlobError> {
        let url = format!("memory://blobs/{}", Uuid::new_v4());
        self.blobs
            .write()
            .await
            .insert(url.clone(), (mime_type.to_string(), bytes));
        Ok(url)
    }
}
