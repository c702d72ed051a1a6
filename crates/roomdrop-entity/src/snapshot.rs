//! Token-redacted room projection for listing and display.

use chrono::{DateTime, Utc};
use serde::Serialize;

use roomdrop_core::types::RoomId;

/// Read-only projection of room state.
///
/// Deliberately carries only counts, never the password hash or token
/// strings, so it is safe to hand to any transport.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub expires_at: DateTime<Utc>,
    pub file_count: usize,
    pub token_count: usize,
}
