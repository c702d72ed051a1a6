//! Persistence port for rooms, tokens, and file metadata.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use roomdrop_core::types::{FileId, RoomId};
use roomdrop_core::ShareResult;

use crate::cleanup::ExpiredCleanup;
use crate::file::RoomFile;
use crate::room::Room;
use crate::snapshot::RoomSnapshot;

/// Storage contract for rooms. Every backend must present identical
/// external behavior under concurrent access: operations touching the
/// same room are linearizable, operations on different rooms do not
/// serialize against each other beyond what the backend engine imposes.
#[async_trait]
pub trait RoomRepository: Send + Sync + 'static {
    /// Fetch a room by id. `Ok(None)` when absent.
    async fn get(&self, id: RoomId) -> ShareResult<Option<Room>>;

    /// Fetch a room only if `token` is a member of its token set.
    ///
    /// `Ok(None)` covers both "no such room" and "token not a member";
    /// callers must not be able to tell the two apart.
    async fn get_by_token(&self, id: RoomId, token: &str) -> ShareResult<Option<Room>>;

    /// Token-redacted projections of every stored room.
    async fn list_snapshots(&self) -> ShareResult<Vec<RoomSnapshot>>;

    /// Persist a new room. Fails with `RoomAlreadyExists` on id collision.
    async fn create(&self, room: &Room) -> ShareResult<()>;

    /// Remove a room with all its tokens and file metadata, returning the
    /// storage paths of its files so the caller can cascade-delete blobs.
    /// Fails with `RoomNotFound` when absent.
    async fn delete(&self, id: RoomId) -> ShareResult<Vec<String>>;

    /// Remove every room with `expires_at < now` in one sweep, each entry
    /// carrying the file paths of the removed room.
    async fn delete_expired(&self, now: DateTime<Utc>) -> ShareResult<Vec<ExpiredCleanup>>;

    /// Attach a bearer token to an existing room. Fails with
    /// `RoomNotFound` when the room is absent.
    async fn add_token(&self, id: RoomId, token: &str) -> ShareResult<()>;

    /// Detach a bearer token. `Ok(false)` when room or token was absent.
    async fn remove_token(&self, id: RoomId, token: &str) -> ShareResult<bool>;

    /// Password hash for a room, `Ok(None)` when absent.
    async fn get_password_hash(&self, id: RoomId) -> ShareResult<Option<String>>;

    /// Attach file metadata, but only after atomically verifying that the
    /// room exists and `token` is a member. `Ok(false)` when either check
    /// fails; never an error for the authorization outcome.
    async fn add_file_by_token(
        &self,
        id: RoomId,
        token: &str,
        file: &RoomFile,
    ) -> ShareResult<bool>;

    /// Detach file metadata under the same atomic room-and-token check,
    /// returning the blob's storage path. `Ok(None)` when the room, token,
    /// or file was absent.
    async fn delete_file_by_token(
        &self,
        id: RoomId,
        file_id: FileId,
        token: &str,
    ) -> ShareResult<Option<String>>;
}
