//! In-memory room repository backed by a mutex-guarded map.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use roomdrop_core::types::{FileId, RoomId};
use roomdrop_core::{ShareError, ShareResult};
use roomdrop_entity::{ExpiredCleanup, Room, RoomFile, RoomRepository, RoomSnapshot};

/// Room repository holding everything in process memory.
///
/// All mutation is serialized behind a single lock; reads hand out deep
/// clones so callers can never alias stored state. Constructed once at
/// startup and shared by reference, never a process-wide singleton.
#[derive(Debug, Default)]
pub struct MemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl MemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<RoomId, Room>> {
        self.rooms.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<RoomId, Room>> {
        self.rooms.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RoomRepository for MemoryRoomRepository {
    async fn get(&self, id: RoomId) -> ShareResult<Option<Room>> {
        Ok(self.read().get(&id).cloned())
    }

    async fn get_by_token(&self, id: RoomId, token: &str) -> ShareResult<Option<Room>> {
        let rooms = self.read();
        Ok(rooms.get(&id).filter(|r| r.has_token(token)).cloned())
    }

    async fn list_snapshots(&self) -> ShareResult<Vec<RoomSnapshot>> {
        Ok(self.read().values().map(Room::snapshot).collect())
    }

    async fn create(&self, room: &Room) -> ShareResult<()> {
        let mut rooms = self.write();
        if rooms.contains_key(&room.id()) {
            return Err(ShareError::RoomAlreadyExists);
        }
        rooms.insert(room.id(), room.clone());
        Ok(())
    }

    async fn delete(&self, id: RoomId) -> ShareResult<Vec<String>> {
        let mut rooms = self.write();
        let room = rooms.remove(&id).ok_or(ShareError::RoomNotFound)?;
        Ok(room.file_paths())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> ShareResult<Vec<ExpiredCleanup>> {
        let mut rooms = self.write();
        let expired: Vec<RoomId> = rooms
            .values()
            .filter(|r| r.expires_at() < now)
            .map(Room::id)
            .collect();

        let mut removed = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(room) = rooms.remove(&id) {
                removed.push(ExpiredCleanup {
                    room_id: id,
                    paths: room.file_paths(),
                });
            }
        }
        Ok(removed)
    }

    async fn add_token(&self, id: RoomId, token: &str) -> ShareResult<()> {
        let mut rooms = self.write();
        let room = rooms.get_mut(&id).ok_or(ShareError::RoomNotFound)?;
        room.add_token(token)
    }

    async fn remove_token(&self, id: RoomId, token: &str) -> ShareResult<bool> {
        let mut rooms = self.write();
        match rooms.get_mut(&id) {
            Some(room) => Ok(room.remove_token(token).is_ok()),
            None => Ok(false),
        }
    }

    async fn get_password_hash(&self, id: RoomId) -> ShareResult<Option<String>> {
        Ok(self.read().get(&id).map(|r| r.password_hash().to_string()))
    }

    async fn add_file_by_token(
        &self,
        id: RoomId,
        token: &str,
        file: &RoomFile,
    ) -> ShareResult<bool> {
        let mut rooms = self.write();
        match rooms.get_mut(&id) {
            Some(room) if room.has_token(token) => {
                room.add_file(file.clone())?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_file_by_token(
        &self,
        id: RoomId,
        file_id: FileId,
        token: &str,
    ) -> ShareResult<Option<String>> {
        let mut rooms = self.write();
        match rooms.get_mut(&id) {
            Some(room) if room.has_token(token) => match room.delete_file(file_id) {
                Ok(file) => Ok(Some(file.path)),
                Err(ShareError::FileNotFound) => Ok(None),
                Err(e) => Err(e),
            },
            _ => Ok(None),
        }
    }
}
