//! Metadata for a file attached to a room.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use roomdrop_core::types::FileId;
use roomdrop_core::{ShareError, ShareResult};

/// Metadata record for one uploaded file.
///
/// `path` is the opaque storage handle returned by the file store;
/// `name` is always a sanitized basename, never a caller-controlled path.
/// Serialized as JSON by the key-value backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomFile {
    pub id: FileId,
    pub path: String,
    pub name: String,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

impl RoomFile {
    /// Build a file record, sanitizing the display name down to its
    /// basename.
    pub fn new(
        path: impl Into<String>,
        name: &str,
        size: u64,
        now: DateTime<Utc>,
    ) -> ShareResult<Self> {
        let path = path.into().trim().to_string();
        let name = name.trim();

        if path.is_empty() || name.is_empty() || size == 0 {
            return Err(ShareError::InvalidFile);
        }

        let safe_name = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or(ShareError::InvalidFile)?
            .to_string();

        Ok(Self {
            id: FileId::new(),
            path,
            name: safe_name,
            size,
            created_at: now,
        })
    }
}
