//! Room repository backed by PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use roomdrop_core::types::{FileId, RoomId};
use roomdrop_core::{ShareError, ShareResult};
use roomdrop_entity::{ExpiredCleanup, Room, RoomFile, RoomRepository, RoomSnapshot};

/// PostgreSQL-backed room repository.
///
/// Every multi-step operation (existence check, token check, mutation)
/// runs inside one transaction so concurrent callers observe it as a
/// single step. Tokens and file rows cascade on room deletion at the
/// schema level.
#[derive(Debug, Clone)]
pub struct PostgresRoomRepository {
    pool: PgPool,
}

impl PostgresRoomRepository {
    /// Create a new repository over an existing pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn begin(&self) -> ShareResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|e| ShareError::database("Failed to begin transaction", e))
    }

    /// Load a full room (row + tokens + files) inside `tx`.
    async fn load_room(
        tx: &mut Transaction<'static, Postgres>,
        id: RoomId,
    ) -> ShareResult<Option<Room>> {
        let row: Option<(RoomId, String, DateTime<Utc>)> =
            sqlx::query_as("SELECT id, password_hash, expires_at FROM rooms WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| ShareError::database("Failed to load room", e))?;

        let Some((id, password_hash, expires_at)) = row else {
            return Ok(None);
        };

        let mut room = Room::hydrate(id, password_hash, expires_at);

        let tokens: Vec<String> =
            sqlx::query_scalar("SELECT token FROM room_tokens WHERE room_id = $1")
                .bind(id)
                .fetch_all(&mut **tx)
                .await
                .map_err(|e| ShareError::database("Failed to load room tokens", e))?;
        for token in tokens {
            room.add_token(token)?;
        }

        let files: Vec<(FileId, String, String, i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, path, name, size, created_at FROM room_files WHERE room_id = $1",
        )
        .bind(id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| ShareError::database("Failed to load room files", e))?;
        for (file_id, path, name, size, created_at) in files {
            room.add_file(RoomFile {
                id: file_id,
                path,
                name,
                size: size as u64,
                created_at,
            })?;
        }

        Ok(Some(room))
    }

    /// Whether `token` is a member of room `id`, checked inside `tx`.
    async fn token_is_member(
        tx: &mut Transaction<'static, Postgres>,
        id: RoomId,
        token: &str,
    ) -> ShareResult<bool> {
        if token.is_empty() {
            return Ok(false);
        }
        let found: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM room_tokens WHERE room_id = $1 AND token = $2")
                .bind(id)
                .bind(token)
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| ShareError::database("Failed to check token", e))?;
        Ok(found.is_some())
    }

    async fn commit(tx: Transaction<'static, Postgres>) -> ShareResult<()> {
        tx.commit()
            .await
            .map_err(|e| ShareError::database("Failed to commit transaction", e))
    }
}

#[async_trait]
impl RoomRepository for PostgresRoomRepository {
    async fn get(&self, id: RoomId) -> ShareResult<Option<Room>> {
        let mut tx = self.begin().await?;
        let room = Self::load_room(&mut tx, id).await?;
        Self::commit(tx).await?;
        Ok(room)
    }

    async fn get_by_token(&self, id: RoomId, token: &str) -> ShareResult<Option<Room>> {
        let mut tx = self.begin().await?;
        if !Self::token_is_member(&mut tx, id, token).await? {
            return Ok(None);
        }
        let room = Self::load_room(&mut tx, id).await?;
        Self::commit(tx).await?;
        Ok(room)
    }

    async fn list_snapshots(&self) -> ShareResult<Vec<RoomSnapshot>> {
        let rows: Vec<(RoomId, DateTime<Utc>, i64, i64)> = sqlx::query_as(
            "SELECT r.id, r.expires_at, \
             (SELECT COUNT(*) FROM room_files f WHERE f.room_id = r.id), \
             (SELECT COUNT(*) FROM room_tokens t WHERE t.room_id = r.id) \
             FROM rooms r",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| ShareError::database("Failed to list rooms", e))?;

        Ok(rows
            .into_iter()
            .map(|(id, expires_at, file_count, token_count)| RoomSnapshot {
                id,
                expires_at,
                file_count: file_count as usize,
                token_count: token_count as usize,
            })
            .collect())
    }

    async fn create(&self, room: &Room) -> ShareResult<()> {
        let mut tx = self.begin().await?;

        sqlx::query("INSERT INTO rooms (id, password_hash, expires_at) VALUES ($1, $2, $3)")
            .bind(room.id())
            .bind(room.password_hash())
            .bind(room.expires_at())
            .execute(&mut *tx)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    ShareError::RoomAlreadyExists
                }
                _ => ShareError::database("Failed to create room", e),
            })?;

        for token in room.tokens() {
            sqlx::query("INSERT INTO room_tokens (room_id, token) VALUES ($1, $2)")
                .bind(room.id())
                .bind(token)
                .execute(&mut *tx)
                .await
                .map_err(|e| ShareError::database("Failed to store room token", e))?;
        }

        for file in room.list_files() {
            sqlx::query(
                "INSERT INTO room_files (id, room_id, path, name, size, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(file.id)
            .bind(room.id())
            .bind(&file.path)
            .bind(&file.name)
            .bind(file.size as i64)
            .bind(file.created_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| ShareError::database("Failed to store room file", e))?;
        }

        Self::commit(tx).await
    }

    async fn delete(&self, id: RoomId) -> ShareResult<Vec<String>> {
        let mut tx = self.begin().await?;

        let paths: Vec<String> =
            sqlx::query_scalar("SELECT path FROM room_files WHERE room_id = $1")
                .bind(id)
                .fetch_all(&mut *tx)
                .await
                .map_err(|e| ShareError::database("Failed to collect file paths", e))?;

        let result = sqlx::query("DELETE FROM rooms WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| ShareError::database("Failed to delete room", e))?;

        if result.rows_affected() == 0 {
            return Err(ShareError::RoomNotFound);
        }

        Self::commit(tx).await?;
        Ok(paths)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> ShareResult<Vec<ExpiredCleanup>> {
        let mut tx = self.begin().await?;

        let rows: Vec<(RoomId, Option<String>)> = sqlx::query_as(
            "SELECT r.id, f.path FROM rooms r \
             LEFT JOIN room_files f ON f.room_id = r.id \
             WHERE r.expires_at < $1 \
             ORDER BY r.id",
        )
        .bind(now)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| ShareError::database("Failed to collect expired rooms", e))?;

        let mut removed: Vec<ExpiredCleanup> = Vec::new();
        for (room_id, path) in rows {
            match removed.last_mut() {
                Some(entry) if entry.room_id == room_id => {
                    if let Some(path) = path {
                        entry.paths.push(path);
                    }
                }
                _ => removed.push(ExpiredCleanup {
                    room_id,
                    paths: path.into_iter().collect(),
                }),
            }
        }

        sqlx::query("DELETE FROM rooms WHERE expires_at < $1")
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| ShareError::database("Failed to delete expired rooms", e))?;

        Self::commit(tx).await?;
        Ok(removed)
    }

    async fn add_token(&self, id: RoomId, token: &str) -> ShareResult<()> {
        if token.is_empty() {
            return Err(ShareError::EmptyToken);
        }

        let mut tx = self.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar("SELECT 1 FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| ShareError::database("Failed to check room", e))?;
        if exists.is_none() {
            return Err(ShareError::RoomNotFound);
        }

        sqlx::query(
            "INSERT INTO room_tokens (room_id, token) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(id)
        .bind(token)
        .execute(&mut *tx)
        .await
        .map_err(|e| ShareError::database("Failed to add token", e))?;

        Self::commit(tx).await
    }

    async fn remove_token(&self, id: RoomId, token: &str) -> ShareResult<bool> {
        let result = sqlx::query("DELETE FROM room_tokens WHERE room_id = $1 AND token = $2")
            .bind(id)
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(|e| ShareError::database("Failed to remove token", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_password_hash(&self, id: RoomId) -> ShareResult<Option<String>> {
        sqlx::query_scalar("SELECT password_hash FROM rooms WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ShareError::database("Failed to load password hash", e))
    }

    async fn add_file_by_token(
        &self,
        id: RoomId,
        token: &str,
        file: &RoomFile,
    ) -> ShareResult<bool> {
        let mut tx = self.begin().await?;

        if !Self::token_is_member(&mut tx, id, token).await? {
            return Ok(false);
        }

        sqlx::query(
            "INSERT INTO room_files (id, room_id, path, name, size, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(file.id)
        .bind(id)
        .bind(&file.path)
        .bind(&file.name)
        .bind(file.size as i64)
        .bind(file.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| ShareError::database("Failed to attach file", e))?;

        Self::commit(tx).await?;
        Ok(true)
    }

    async fn delete_file_by_token(
        &self,
        id: RoomId,
        file_id: FileId,
        token: &str,
    ) -> ShareResult<Option<String>> {
        let mut tx = self.begin().await?;

        if !Self::token_is_member(&mut tx, id, token).await? {
            return Ok(None);
        }

        let path: Option<String> = sqlx::query_scalar(
            "DELETE FROM room_files WHERE id = $1 AND room_id = $2 RETURNING path",
        )
        .bind(file_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| ShareError::database("Failed to detach file", e))?;

        Self::commit(tx).await?;
        Ok(path)
    }
}
