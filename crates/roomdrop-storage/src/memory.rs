//! In-memory blob store for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use uuid::Uuid;

use roomdrop_core::traits::{ByteStream, FileStore};
use roomdrop_core::{ShareError, ShareResult};

/// Blob store holding everything in a process-local map.
///
/// Paths look like `mem://<uuid>-<name>` so tests can assert on them
/// without touching the filesystem.
#[derive(Debug, Default)]
pub struct MemoryFileStore {
    blobs: Mutex<HashMap<String, Bytes>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Bytes>> {
        self.blobs.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl FileStore for MemoryFileStore {
    async fn save(
        &self,
        _upload_dir: &str,
        name: &str,
        mut reader: ByteStream,
    ) -> ShareResult<(String, u64)> {
        let mut data = Vec::new();
        while let Some(chunk) = reader.next().await {
            let chunk = chunk.map_err(|e| ShareError::storage("Stream read error", e))?;
            data.extend_from_slice(&chunk);
        }

        let path = format!("mem://{}-{name}", Uuid::new_v4());
        let size = data.len() as u64;
        self.lock().insert(path.clone(), Bytes::from(data));
        Ok((path, size))
    }

    async fn open(&self, path: &str) -> ShareResult<ByteStream> {
        let blob = self.lock().get(path).cloned().ok_or(ShareError::FileNotFound)?;
        Ok(Box::pin(stream::once(async move { Ok(blob) })))
    }

    async fn exists(&self, path: &str) -> ShareResult<bool> {
        Ok(self.lock().contains_key(path))
    }

    async fn delete(&self, path: &str) -> ShareResult<()> {
        self.lock().remove(path);
        Ok(())
    }

    async fn clear_all(&self, _upload_dir: &str) -> ShareResult<()> {
        self.lock().clear();
        Ok(())
    }
}
