//! The room aggregate: tokens and files of one ephemeral room.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use chrono::{DateTime, Utc};

use roomdrop_core::types::{FileId, RoomId};
use roomdrop_core::{ShareError, ShareResult};

use crate::file::RoomFile;
use crate::snapshot::RoomSnapshot;

/// An ephemeral, password-protected container for uploaded files.
///
/// The expiry is fixed at construction (`now + lifespan`) and never
/// extended. The token set is always present; a room with zero tokens is
/// still valid until it expires. Logging the last holder out does not
/// delete the room.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    expires_at: DateTime<Utc>,
    files: HashMap<FileId, RoomFile>,
    tokens: HashSet<String>,
    password_hash: String,
}

impl Room {
    /// Create a new room expiring `lifespan` from now.
    pub fn new(password_hash: impl Into<String>, lifespan: Duration) -> ShareResult<Self> {
        let password_hash = password_hash.into();
        if password_hash.is_empty() {
            return Err(ShareError::EmptyPasswordHash);
        }
        if lifespan.is_zero() {
            return Err(ShareError::InvalidRoomTtl);
        }

        let lifespan = chrono::Duration::from_std(lifespan)
            .map_err(|_| ShareError::InvalidRoomTtl)?;

        Ok(Self {
            id: RoomId::new(),
            expires_at: Utc::now() + lifespan,
            files: HashMap::new(),
            tokens: HashSet::new(),
            password_hash,
        })
    }

    /// Reconstruct a room from persisted state.
    ///
    /// Used by repository backends; skips the lifespan check because the
    /// stored expiry may legitimately be in the past (the sweep has not
    /// run yet).
    pub fn hydrate(
        id: RoomId,
        password_hash: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            expires_at,
            files: HashMap::new(),
            tokens: HashSet::new(),
            password_hash: password_hash.into(),
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    /// Whether the room is past its expiry at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    // ── Tokens ─────────────────────────────────────────────────

    /// Whether `token` is a member of this room's token set.
    pub fn has_token(&self, token: &str) -> bool {
        !token.is_empty() && self.tokens.contains(token)
    }

    /// Add a bearer token to the room.
    pub fn add_token(&mut self, token: impl Into<String>) -> ShareResult<()> {
        let token = token.into();
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        self.tokens.insert(token);
        Ok(())
    }

    /// Remove a bearer token from the room.
    pub fn remove_token(&mut self, token: &str) -> ShareResult<()> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        if !self.tokens.remove(token) {
            return Err(ShareError::TokenNotFound);
        }
        Ok(())
    }

    pub fn tokens_count(&self) -> usize {
        self.tokens.len()
    }

    /// The token set, for persistence. Never exposed by snapshots.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    // ── Files ──────────────────────────────────────────────────

    /// Attach file metadata to the room.
    pub fn add_file(&mut self, file: RoomFile) -> ShareResult<()> {
        if file.name.is_empty() || file.path.is_empty() || file.size == 0 {
            return Err(ShareError::InvalidFile);
        }
        self.files.insert(file.id, file);
        Ok(())
    }

    pub fn get_file(&self, id: FileId) -> Option<&RoomFile> {
        self.files.get(&id)
    }

    pub fn list_files(&self) -> Vec<&RoomFile> {
        self.files.values().collect()
    }

    /// Detach a file, returning its metadata.
    pub fn delete_file(&mut self, id: FileId) -> ShareResult<RoomFile> {
        self.files.remove(&id).ok_or(ShareError::FileNotFound)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Sum of attached file sizes, for quota checks.
    pub fn total_bytes(&self) -> u64 {
        self.files.values().map(|f| f.size).sum()
    }

    /// Storage paths of every attached file, for cascading blob deletion.
    pub fn file_paths(&self) -> Vec<String> {
        self.files
            .values()
            .filter(|f| !f.path.is_empty())
            .map(|f| f.path.clone())
            .collect()
    }

    /// Token-redacted projection of this room.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            id: self.id,
            expires_at: self.expires_at,
            file_count: self.files.len(),
            token_count: self.tokens.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room() -> Room {
        Room::new("hash", Duration::from_secs(60)).unwrap()
    }

    fn file(name: &str) -> RoomFile {
        RoomFile::new(format!("/tmp/{name}"), name, 3, Utc::now()).unwrap()
    }

    #[test]
    fn new_rejects_empty_password_hash() {
        assert!(matches!(
            Room::new("", Duration::from_secs(60)),
            Err(ShareError::EmptyPasswordHash)
        ));
    }

    #[test]
    fn new_rejects_zero_lifespan() {
        assert!(matches!(
            Room::new("hash", Duration::ZERO),
            Err(ShareError::InvalidRoomTtl)
        ));
    }

    #[test]
    fn token_membership() {
        let mut r = room();
        r.add_token("t1").unwrap();
        assert!(r.has_token("t1"));
        assert!(!r.has_token("t2"));
        assert!(!r.has_token(""));
        assert_eq!(r.tokens_count(), 1);
    }

    #[test]
    fn add_token_rejects_empty() {
        let mut r = room();
        assert!(matches!(r.add_token(""), Err(ShareError::EmptyToken)));
    }

    #[test]
    fn remove_absent_token_fails() {
        let mut r = room();
        assert!(matches!(
            r.remove_token("nope"),
            Err(ShareError::TokenNotFound)
        ));
    }

    #[test]
    fn room_with_zero_tokens_is_still_valid() {
        let mut r = room();
        r.add_token("t1").unwrap();
        r.remove_token("t1").unwrap();
        assert_eq!(r.tokens_count(), 0);
        assert!(!r.is_expired(Utc::now()));
    }

    #[test]
    fn file_lifecycle() {
        let mut r = room();
        let f = file("a.txt");
        let id = f.id;
        r.add_file(f).unwrap();
        assert_eq!(r.file_count(), 1);
        assert_eq!(r.get_file(id).unwrap().name, "a.txt");
        assert_eq!(r.total_bytes(), 3);

        let removed = r.delete_file(id).unwrap();
        assert_eq!(removed.id, id);
        assert!(matches!(r.delete_file(id), Err(ShareError::FileNotFound)));
    }

    #[test]
    fn expiry_is_fixed_at_creation() {
        let r = room();
        assert!(!r.is_expired(Utc::now()));
        assert!(r.is_expired(r.expires_at() + chrono::Duration::seconds(1)));
    }

    #[test]
    fn snapshot_redacts_secrets() {
        let mut r = room();
        r.add_token("secret-token").unwrap();
        let snap = r.snapshot();
        assert_eq!(snap.token_count, 1);
        assert_eq!(snap.file_count, 0);
        let json = serde_json::to_string(&snap).unwrap();
        assert!(!json.contains("secret-token"));
        assert!(!json.contains("hash"));
    }
}
