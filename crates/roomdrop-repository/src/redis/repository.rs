//! Room repository backed by Redis.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde::{Deserialize, Serialize};
use tracing::warn;

use roomdrop_core::types::{FileId, RoomId};
use roomdrop_core::{ShareError, ShareResult};
use roomdrop_entity::{ExpiredCleanup, Room, RoomFile, RoomRepository, RoomSnapshot};

use super::client::RedisClient;
use super::keys;

/// Attempts per optimistic transaction before giving up.
const MAX_TXN_RETRIES: usize = 5;

/// JSON payload stored under the room record key.
#[derive(Debug, Serialize, Deserialize)]
struct RoomRecord {
    password_hash: String,
    expires_at: DateTime<Utc>,
}

/// Redis-backed room repository.
///
/// Single-room mutations run as WATCH / MULTI / EXEC transactions on a
/// dedicated connection and retry when a concurrent writer invalidates
/// the watch. The expiry sweep is a best-effort scan: each room's removal
/// is independently atomic, the sweep as a whole is not.
#[derive(Debug, Clone)]
pub struct RedisRoomRepository {
    client: RedisClient,
}

impl RedisRoomRepository {
    /// Create a new repository over an existing client.
    pub fn new(client: RedisClient) -> Self {
        Self { client }
    }

    fn map_err(e: redis::RedisError) -> ShareError {
        ShareError::cache(format!("Redis error: {e}"), e)
    }

    /// Room keys for `id` under the configured prefix.
    fn keys_for(&self, id: RoomId) -> (String, String, String) {
        let prefix = self.client.prefix();
        (
            keys::room(prefix, id),
            keys::room_tokens(prefix, id),
            keys::room_files(prefix, id),
        )
    }

    /// Fetch and parse the room record, `None` when absent.
    async fn load_record(
        conn: &mut (impl redis::aio::ConnectionLike + Send + Sync),
        room_key: &str,
    ) -> ShareResult<Option<RoomRecord>> {
        let raw: Option<String> = conn.get(room_key).await.map_err(Self::map_err)?;
        raw.map(|r| serde_json::from_str(&r).map_err(ShareError::from))
            .transpose()
    }

    /// Assemble a full room from its three keys on the shared connection.
    async fn load_room(&self, id: RoomId) -> ShareResult<Option<Room>> {
        let (room_key, tokens_key, files_key) = self.keys_for(id);
        let mut conn = self.client.conn_mut();

        let Some(record) = Self::load_record(&mut conn, &room_key).await? else {
            return Ok(None);
        };

        let mut room = Room::hydrate(id, record.password_hash, record.expires_at);

        let tokens: Vec<String> = conn.smembers(&tokens_key).await.map_err(Self::map_err)?;
        for token in tokens {
            room.add_token(token)?;
        }

        let files: Vec<String> = conn.hvals(&files_key).await.map_err(Self::map_err)?;
        for raw in files {
            let file: RoomFile = serde_json::from_str(&raw)?;
            room.add_file(file)?;
        }

        Ok(Some(room))
    }

    /// Room ids of every record key currently in the store.
    async fn scan_room_ids(&self) -> ShareResult<Vec<RoomId>> {
        let pattern = keys::room_pattern(self.client.prefix());
        let mut conn = self.client.conn_mut();
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut conn)
            .await
            .map_err(Self::map_err)?;

        Ok(keys
            .iter()
            .filter_map(|k| keys::parse_room_key(self.client.prefix(), k))
            .collect())
    }

    /// Delete one room atomically, returning its file paths.
    ///
    /// `Ok(None)` when the room disappeared before or during the
    /// transaction (a concurrent sweep or explicit delete won the race).
    async fn delete_one(&self, id: RoomId) -> ShareResult<Option<Vec<String>>> {
        let (room_key, tokens_key, files_key) = self.keys_for(id);

        for _ in 0..MAX_TXN_RETRIES {
            let mut conn = self.client.dedicated_connection().await?;
            watch(&mut conn, &[&room_key, &files_key]).await?;

            // Dropping the connection discards the watch on early return.
            if Self::load_record(&mut conn, &room_key).await?.is_none() {
                return Ok(None);
            }

            let files: Vec<String> = conn.hvals(&files_key).await.map_err(Self::map_err)?;
            let mut paths = Vec::with_capacity(files.len());
            for raw in files {
                let file: RoomFile = serde_json::from_str(&raw)?;
                paths.push(file.path);
            }

            let mut pipe = redis::pipe();
            pipe.atomic()
                .del(&[&room_key, &tokens_key, &files_key])
                .ignore();
            let result: Option<()> = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
            if result.is_some() {
                return Ok(Some(paths));
            }
        }

        Err(retry_exhausted())
    }
}

#[async_trait]
impl RoomRepository for RedisRoomRepository {
    async fn get(&self, id: RoomId) -> ShareResult<Option<Room>> {
        self.load_room(id).await
    }

    async fn get_by_token(&self, id: RoomId, token: &str) -> ShareResult<Option<Room>> {
        if token.is_empty() {
            return Ok(None);
        }
        let (_, tokens_key, _) = self.keys_for(id);
        let mut conn = self.client.conn_mut();
        let member: bool = conn
            .sismember(&tokens_key, token)
            .await
            .map_err(Self::map_err)?;
        if !member {
            return Ok(None);
        }
        self.load_room(id).await
    }

    async fn list_snapshots(&self) -> ShareResult<Vec<RoomSnapshot>> {
        let ids = self.scan_room_ids().await?;
        let mut conn = self.client.conn_mut();
        let mut snapshots = Vec::with_capacity(ids.len());

        for id in ids {
            let (room_key, tokens_key, files_key) = self.keys_for(id);
            // A room may vanish between the scan and the read.
            let Some(record) = Self::load_record(&mut conn, &room_key).await? else {
                continue;
            };
            let token_count: usize = conn.scard(&tokens_key).await.map_err(Self::map_err)?;
            let file_count: usize = conn.hlen(&files_key).await.map_err(Self::map_err)?;
            snapshots.push(RoomSnapshot {
                id,
                expires_at: record.expires_at,
                file_count,
                token_count,
            });
        }

        Ok(snapshots)
    }

    async fn create(&self, room: &Room) -> ShareResult<()> {
        let (room_key, tokens_key, files_key) = self.keys_for(room.id());
        let record = serde_json::to_string(&RoomRecord {
            password_hash: room.password_hash().to_string(),
            expires_at: room.expires_at(),
        })?;

        for _ in 0..MAX_TXN_RETRIES {
            let mut conn = self.client.dedicated_connection().await?;
            watch(&mut conn, &[&room_key]).await?;

            let exists: bool = conn.exists(&room_key).await.map_err(Self::map_err)?;
            if exists {
                return Err(ShareError::RoomAlreadyExists);
            }

            let mut pipe = redis::pipe();
            pipe.atomic();
            pipe.set(&room_key, &record).ignore();
            let tokens: Vec<&str> = room.tokens().collect();
            if !tokens.is_empty() {
                pipe.sadd(&tokens_key, tokens).ignore();
            }
            for file in room.list_files() {
                pipe.hset(&files_key, file.id.to_string(), serde_json::to_string(file)?)
                    .ignore();
            }

            let result: Option<()> = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
            if result.is_some() {
                return Ok(());
            }
        }

        Err(retry_exhausted())
    }

    async fn delete(&self, id: RoomId) -> ShareResult<Vec<String>> {
        self.delete_one(id).await?.ok_or(ShareError::RoomNotFound)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> ShareResult<Vec<ExpiredCleanup>> {
        let ids = self.scan_room_ids().await?;
        let mut removed = Vec::new();

        for id in ids {
            let (room_key, _, _) = self.keys_for(id);
            let mut conn = self.client.conn_mut();
            let Some(record) = Self::load_record(&mut conn, &room_key).await? else {
                continue;
            };
            if record.expires_at >= now {
                continue;
            }

            // Best-effort sweep: one room failing must not block the rest.
            match self.delete_one(id).await {
                Ok(Some(paths)) => removed.push(ExpiredCleanup { room_id: id, paths }),
                Ok(None) => {}
                Err(e) => warn!(room_id = %id, error = %e, "Failed to sweep expired room"),
            }
        }

        Ok(removed)
    }

    async fn add_token(&self, id: RoomId, token: &str) -> ShareResult<()> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }
        let (room_key, tokens_key, _) = self.keys_for(id);

        for _ in 0..MAX_TXN_RETRIES {
            let mut conn = self.client.dedicated_connection().await?;
            watch(&mut conn, &[&room_key]).await?;

            let exists: bool = conn.exists(&room_key).await.map_err(Self::map_err)?;
            if !exists {
                return Err(ShareError::RoomNotFound);
            }

            let mut pipe = redis::pipe();
            pipe.atomic().sadd(&tokens_key, token).ignore();
            let result: Option<()> = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
            if result.is_some() {
                return Ok(());
            }
        }

        Err(retry_exhausted())
    }

    async fn remove_token(&self, id: RoomId, token: &str) -> ShareResult<bool> {
        let (_, tokens_key, _) = self.keys_for(id);
        let mut conn = self.client.conn_mut();
        let removed: i64 = conn
            .srem(&tokens_key, token)
            .await
            .map_err(Self::map_err)?;
        Ok(removed > 0)
    }

    async fn get_password_hash(&self, id: RoomId) -> ShareResult<Option<String>> {
        let (room_key, _, _) = self.keys_for(id);
        let mut conn = self.client.conn_mut();
        Ok(Self::load_record(&mut conn, &room_key)
            .await?
            .map(|r| r.password_hash))
    }

    async fn add_file_by_token(
        &self,
        id: RoomId,
        token: &str,
        file: &RoomFile,
    ) -> ShareResult<bool> {
        if token.is_empty() {
            return Ok(false);
        }
        let (room_key, tokens_key, files_key) = self.keys_for(id);
        let payload = serde_json::to_string(file)?;

        for _ in 0..MAX_TXN_RETRIES {
            let mut conn = self.client.dedicated_connection().await?;
            watch(&mut conn, &[&room_key, &tokens_key]).await?;

            let exists: bool = conn.exists(&room_key).await.map_err(Self::map_err)?;
            let member: bool = conn
                .sismember(&tokens_key, token)
                .await
                .map_err(Self::map_err)?;
            if !exists || !member {
                return Ok(false);
            }

            let mut pipe = redis::pipe();
            pipe.atomic()
                .hset(&files_key, file.id.to_string(), &payload)
                .ignore();
            let result: Option<()> = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
            if result.is_some() {
                return Ok(true);
            }
        }

        Err(retry_exhausted())
    }

    async fn delete_file_by_token(
        &self,
        id: RoomId,
        file_id: FileId,
        token: &str,
    ) -> ShareResult<Option<String>> {
        if token.is_empty() {
            return Ok(None);
        }
        let (room_key, tokens_key, files_key) = self.keys_for(id);
        let field = file_id.to_string();

        for _ in 0..MAX_TXN_RETRIES {
            let mut conn = self.client.dedicated_connection().await?;
            watch(&mut conn, &[&room_key, &tokens_key, &files_key]).await?;

            let exists: bool = conn.exists(&room_key).await.map_err(Self::map_err)?;
            let member: bool = conn
                .sismember(&tokens_key, token)
                .await
                .map_err(Self::map_err)?;
            if !exists || !member {
                return Ok(None);
            }

            let raw: Option<String> = conn
                .hget(&files_key, &field)
                .await
                .map_err(Self::map_err)?;
            let Some(raw) = raw else {
                return Ok(None);
            };
            let file: RoomFile = serde_json::from_str(&raw)?;

            let mut pipe = redis::pipe();
            pipe.atomic().hdel(&files_key, &field).ignore();
            let result: Option<()> = pipe.query_async(&mut conn).await.map_err(Self::map_err)?;
            if result.is_some() {
                return Ok(Some(file.path));
            }
        }

        Err(retry_exhausted())
    }
}

/// Issue WATCH for `keys` on a dedicated connection.
async fn watch(conn: &mut MultiplexedConnection, watched: &[&str]) -> ShareResult<()> {
    let mut cmd = redis::cmd("WATCH");
    for key in watched {
        cmd.arg(key);
    }
    cmd.query_async::<()>(conn)
        .await
        .map_err(RedisRoomRepository::map_err)
}

fn retry_exhausted() -> ShareError {
    ShareError::Cache {
        message: format!("transaction aborted after {MAX_TXN_RETRIES} retries"),
        source: None,
    }
}
