//! File store trait for uploaded blob content.

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;

use crate::result::ShareResult;

/// A byte stream type used for reading and writing file contents.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Byte-level save/open/delete of uploaded content, keyed by an opaque
/// storage path.
///
/// The repository layer never touches blob content; it only records the
/// paths this trait hands out, and returns them on room deletion so the
/// caller can cascade-delete.
#[async_trait]
pub trait FileStore: Send + Sync + 'static {
    /// Stream the reader to storage under `upload_dir` and return the
    /// opaque storage path plus the number of bytes written.
    async fn save(
        &self,
        upload_dir: &str,
        name: &str,
        reader: ByteStream,
    ) -> ShareResult<(String, u64)>;

    /// Open a previously saved blob for reading.
    async fn open(&self, path: &str) -> ShareResult<ByteStream>;

    /// Check whether a blob exists at the given path.
    async fn exists(&self, path: &str) -> ShareResult<bool>;

    /// Delete a blob. Deleting an already-absent path is not an error.
    async fn delete(&self, path: &str) -> ShareResult<()>;

    /// Remove every blob under `upload_dir`.
    async fn clear_all(&self, upload_dir: &str) -> ShareResult<()>;
}
