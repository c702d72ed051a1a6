//! Password hashing and bearer-token issuance ports.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::result::ShareResult;
use crate::types::RoomId;

/// Opaque password hashing and verification.
pub trait PasswordHasher: Send + Sync + 'static {
    /// Hash a plaintext password.
    fn hash(&self, plain: &str) -> ShareResult<String>;

    /// Verify a plaintext password against a stored hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only for malformed hashes
    /// or hasher failures.
    fn verify(&self, plain: &str, hash: &str) -> ShareResult<bool>;
}

/// Bearer-token issuance and validation, scoped to a room id.
#[async_trait]
pub trait TokenService: Send + Sync + 'static {
    /// Issue a token scoped to `room_id`, valid for `ttl`.
    ///
    /// Returns the token string and its absolute expiry.
    async fn issue(&self, room_id: RoomId, ttl: Duration) -> ShareResult<(String, DateTime<Utc>)>;

    /// Validate a token's signature and expiry.
    async fn validate(&self, token: &str) -> ShareResult<()>;

    /// Validate a token and additionally fail with `TokenRoomMismatch`
    /// if the token's embedded room id does not match `room_id`.
    async fn validate_with_room(&self, room_id: RoomId, token: &str) -> ShareResult<()>;
}
