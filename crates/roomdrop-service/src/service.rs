//! Room file-sharing orchestration.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use roomdrop_core::traits::{ByteStream, FileStore, PasswordHasher, TokenService};
use roomdrop_core::types::{FileId, RoomId};
use roomdrop_core::{ShareError, ShareResult};
use roomdrop_entity::{Room, RoomFile, RoomRepository, RoomSnapshot, SharePolicy};

/// Outcome of an expiry sweep.
///
/// Blob deletion during the sweep is best-effort; `error` joins any
/// individual failures for logging while `removed` still lists every
/// room that was taken out.
#[derive(Debug)]
pub struct CleanupReport {
    pub removed: Vec<RoomId>,
    pub error: Option<ShareError>,
}

/// Stateless orchestrator for room lifecycle and file transfer.
///
/// Holds the policy plus its collaborators behind trait objects; every
/// public method is safe to call concurrently from many tasks.
#[derive(Clone)]
pub struct FileShareService {
    repo: Arc<dyn RoomRepository>,
    store: Arc<dyn FileStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenService>,
    policy: SharePolicy,
}

impl FileShareService {
    pub fn new(
        repo: Arc<dyn RoomRepository>,
        store: Arc<dyn FileStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenService>,
        policy: SharePolicy,
    ) -> Self {
        Self {
            repo,
            store,
            hasher,
            tokens,
            policy,
        }
    }

    pub fn policy(&self) -> &SharePolicy {
        &self.policy
    }

    /// Create a room protected by `password`, returning its snapshot and
    /// the first bearer token.
    ///
    /// A missing or zero lifespan falls back to the policy default; the
    /// initial token lives exactly as long as the room.
    pub async fn create_room(
        &self,
        password: &str,
        lifespan: Option<Duration>,
    ) -> ShareResult<(RoomSnapshot, String)> {
        let password = password.trim();
        if password.is_empty() {
            return Err(ShareError::EmptyPassword);
        }

        let lifespan = effective_ttl(lifespan, self.policy.default_room_ttl);
        if exceeds(lifespan, self.policy.max_room_lifespan) {
            return Err(ShareError::RoomLifespanTooLong);
        }

        let hash = self.hasher.hash(password)?;
        let mut room = Room::new(hash, lifespan)?;
        let (token, _) = self.tokens.issue(room.id(), lifespan).await?;
        room.add_token(token.clone())?;

        self.repo.create(&room).await?;
        info!(room_id = %room.id(), expires_at = %room.expires_at(), "Room created");
        Ok((room.snapshot(), token))
    }

    /// Authenticate against an existing room and mint a fresh token.
    pub async fn auth_room(
        &self,
        id: RoomId,
        password: &str,
        lifespan: Option<Duration>,
    ) -> ShareResult<(String, DateTime<Utc>)> {
        let password = password.trim();
        if password.is_empty() {
            return Err(ShareError::EmptyPassword);
        }

        let hash = self
            .repo
            .get_password_hash(id)
            .await?
            .ok_or(ShareError::RoomNotFound)?;
        if !self.hasher.verify(password, &hash)? {
            return Err(ShareError::InvalidPassword);
        }

        let ttl = effective_ttl(lifespan, self.policy.default_token_ttl);
        if exceeds(ttl, self.policy.max_token_lifespan) {
            return Err(ShareError::TokenLifespanTooLong);
        }

        let (token, expires_at) = self.tokens.issue(id, ttl).await?;
        self.repo.add_token(id, &token).await?;
        Ok((token, expires_at))
    }

    /// Discard one bearer token. The room stays valid even when its last
    /// token is removed.
    pub async fn logout_room(&self, id: RoomId, token: &str) -> ShareResult<()> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        if !self.repo.remove_token(id, token).await? {
            return Err(ShareError::TokenNotFound);
        }
        Ok(())
    }

    /// Delete a room and best-effort delete its blobs.
    ///
    /// Requires a valid token; non-holders get `RoomNotFound` so room
    /// existence is never revealed to them.
    pub async fn delete_room(&self, id: RoomId, token: &str) -> ShareResult<()> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        if self.repo.get_by_token(id, token).await?.is_none() {
            return Err(ShareError::RoomNotFound);
        }

        let paths = self.repo.delete(id).await?;
        info!(room_id = %id, files = paths.len(), "Room deleted");

        let mut errors = Vec::new();
        for path in &paths {
            if let Err(e) = self.store.delete(path).await {
                warn!(room_id = %id, %path, error = %e, "Failed to delete blob");
                errors.push(e);
            }
        }
        ShareError::join_cleanup(errors).map_or(Ok(()), Err)
    }

    /// Stream-save an upload and attach it to the room.
    ///
    /// If anything fails after the blob hit the store, the orphaned blob
    /// is deleted before the error propagates.
    pub async fn upload_file(
        &self,
        id: RoomId,
        token: &str,
        filename: &str,
        reader: ByteStream,
    ) -> ShareResult<RoomFile> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(ShareError::EmptyFilename);
        }

        let room = self
            .repo
            .get_by_token(id, token)
            .await?
            .ok_or(ShareError::RoomNotFound)?;
        if limit_reached(room.file_count() as u64 + 1, self.policy.max_files as u64) {
            return Err(ShareError::TooManyFiles);
        }

        let (path, size) = self
            .store
            .save(&self.policy.upload_dir, filename, reader)
            .await?;

        match self.attach_file(&room, token, &path, filename, size).await {
            Ok(file) => {
                info!(room_id = %id, file_id = %file.id, size, "File uploaded");
                Ok(file)
            }
            Err(e) => {
                // No leaked blobs on a failed attach.
                if let Err(del) = self.store.delete(&path).await {
                    warn!(room_id = %id, %path, error = %del, "Failed to delete orphaned blob");
                }
                Err(e)
            }
        }
    }

    async fn attach_file(
        &self,
        room: &Room,
        token: &str,
        path: &str,
        filename: &str,
        size: u64,
    ) -> ShareResult<RoomFile> {
        if limit_reached(room.total_bytes() + size, self.policy.max_room_bytes) {
            return Err(ShareError::RoomQuotaExceeded);
        }

        let file = RoomFile::new(path, filename, size, Utc::now())?;
        if !self
            .repo
            .add_file_by_token(room.id(), token, &file)
            .await?
        {
            return Err(ShareError::RoomNotFound);
        }
        Ok(file)
    }

    /// Open a download stream for one file.
    pub async fn download_file(
        &self,
        id: RoomId,
        file_id: FileId,
        token: &str,
    ) -> ShareResult<(RoomFile, ByteStream)> {
        let file = self.file(id, file_id, token).await?;
        let stream = self.store.open(&file.path).await?;
        Ok((file, stream))
    }

    /// List file metadata for a room, newest last.
    pub async fn files(&self, id: RoomId, token: &str) -> ShareResult<Vec<RoomFile>> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        let room = self
            .repo
            .get_by_token(id, token)
            .await?
            .ok_or(ShareError::RoomNotFound)?;

        let mut files: Vec<RoomFile> = room.list_files().into_iter().cloned().collect();
        files.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.name.cmp(&b.name)));
        Ok(files)
    }

    /// Metadata for one file.
    pub async fn file(&self, id: RoomId, file_id: FileId, token: &str) -> ShareResult<RoomFile> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        let room = self
            .repo
            .get_by_token(id, token)
            .await?
            .ok_or(ShareError::RoomNotFound)?;
        room.get_file(file_id)
            .cloned()
            .ok_or(ShareError::FileNotFound)
    }

    /// Detach a file and delete its blob. Any valid room token may act.
    pub async fn delete_file(&self, id: RoomId, file_id: FileId, token: &str) -> ShareResult<()> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        let path = self
            .repo
            .delete_file_by_token(id, file_id, token)
            .await?
            .ok_or(ShareError::FileNotFound)?;
        self.store.delete(&path).await?;
        info!(room_id = %id, file_id = %file_id, "File deleted");
        Ok(())
    }

    /// Sweep expired rooms and best-effort delete their blobs.
    pub async fn cleanup_expired(&self, now: DateTime<Utc>) -> ShareResult<CleanupReport> {
        let cleanups = self.repo.delete_expired(now).await?;

        let mut removed = Vec::with_capacity(cleanups.len());
        let mut errors = Vec::new();
        for cleanup in cleanups {
            for path in &cleanup.paths {
                if let Err(e) = self.store.delete(path).await {
                    warn!(room_id = %cleanup.room_id, %path, error = %e, "Failed to delete blob");
                    errors.push(e);
                }
            }
            removed.push(cleanup.room_id);
        }

        if !removed.is_empty() {
            info!(count = removed.len(), "Expired rooms removed");
        }
        Ok(CleanupReport {
            removed,
            error: ShareError::join_cleanup(errors),
        })
    }

    /// Token-scoped snapshot of one room.
    pub async fn room(&self, id: RoomId, token: &str) -> ShareResult<RoomSnapshot> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        let room = self
            .repo
            .get_by_token(id, token)
            .await?
            .ok_or(ShareError::RoomNotFound)?;
        Ok(room.snapshot())
    }

    /// Snapshots of every room.
    pub async fn rooms(&self) -> ShareResult<Vec<RoomSnapshot>> {
        self.repo.list_snapshots().await
    }

    /// Verify that `token` is both cryptographically valid for `id` and
    /// still a member of the room's token set.
    pub async fn check_room_access(&self, id: RoomId, token: &str) -> ShareResult<()> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        self.tokens.validate_with_room(id, token).await?;
        if self.repo.get_by_token(id, token).await?.is_none() {
            return Err(ShareError::RoomNotFound);
        }
        Ok(())
    }
}

/// Substitute the policy default for a missing or zero lifespan.
fn effective_ttl(requested: Option<Duration>, default: Duration) -> Duration {
    match requested {
        Some(d) if !d.is_zero() => d,
        _ => default,
    }
}

/// Whether `value` breaches a policy maximum. Zero maxima are unbounded.
fn exceeds(value: Duration, max: Duration) -> bool {
    !max.is_zero() && value > max
}

fn limit_reached(value: u64, max: u64) -> bool {
    max != 0 && value > max
}
