//! Local filesystem blob store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::debug;
use uuid::Uuid;

use roomdrop_core::traits::{ByteStream, FileStore};
use roomdrop_core::{ShareError, ShareResult};

/// Blob store writing uploads to the local filesystem.
///
/// Stored filenames are prefixed with a random UUID so two uploads with
/// the same display name never collide.
#[derive(Debug, Clone, Default)]
pub struct DiskFileStore;

impl DiskFileStore {
    pub fn new() -> Self {
        Self
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(path: &Path) -> ShareResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ShareError::storage(
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileStore for DiskFileStore {
    async fn save(
        &self,
        upload_dir: &str,
        name: &str,
        mut reader: ByteStream,
    ) -> ShareResult<(String, u64)> {
        // Keep only the basename of the caller-supplied name.
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(ShareError::EmptyFilename)?;
        let full_path = PathBuf::from(upload_dir).join(format!("{}-{base}", Uuid::new_v4()));
        Self::ensure_parent(&full_path).await?;

        let mut file = fs::File::create(&full_path).await.map_err(|e| {
            ShareError::storage(format!("Failed to create file: {}", full_path.display()), e)
        })?;

        let mut total_bytes = 0u64;
        while let Some(chunk) = reader.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    // Do not leave a partial blob behind.
                    drop(file);
                    let _ = fs::remove_file(&full_path).await;
                    return Err(ShareError::storage("Stream read error", e));
                }
            };
            total_bytes += chunk.len() as u64;
            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                let _ = fs::remove_file(&full_path).await;
                return Err(ShareError::storage("Failed to write chunk", e));
            }
        }

        file.flush()
            .await
            .map_err(|e| ShareError::storage("Failed to flush file", e))?;

        let path = full_path.to_string_lossy().into_owned();
        debug!(%path, bytes = total_bytes, "Wrote file from stream");
        Ok((path, total_bytes))
    }

    async fn open(&self, path: &str) -> ShareResult<ByteStream> {
        let file = fs::File::open(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ShareError::FileNotFound
            } else {
                ShareError::storage(format!("Failed to open file: {path}"), e)
            }
        })?;
        Ok(Box::pin(ReaderStream::new(file)))
    }

    async fn exists(&self, path: &str) -> ShareResult<bool> {
        fs::try_exists(path)
            .await
            .map_err(|e| ShareError::storage(format!("Failed to stat file: {path}"), e))
    }

    async fn delete(&self, path: &str) -> ShareResult<()> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            // Deleting an already-absent blob is not an error.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ShareError::storage(
                format!("Failed to delete file: {path}"),
                e,
            )),
        }
    }

    async fn clear_all(&self, upload_dir: &str) -> ShareResult<()> {
        match fs::remove_dir_all(upload_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ShareError::storage(
                    format!("Failed to clear upload dir: {upload_dir}"),
                    e,
                ));
            }
        }
        fs::create_dir_all(upload_dir).await.map_err(|e| {
            ShareError::storage(format!("Failed to recreate upload dir: {upload_dir}"), e)
        })?;
        debug!(upload_dir, "Cleared upload directory");
        Ok(())
    }
}
