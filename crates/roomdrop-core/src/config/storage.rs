//! File storage configuration.

use serde::{Deserialize, Serialize};

/// File storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory uploaded blobs are written to.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Whether to wipe the upload directory at startup. Rooms do not
    /// survive a restart of the in-memory backend, so stale blobs would
    /// otherwise accumulate.
    #[serde(default)]
    pub clear_on_start: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            clear_on_start: false,
        }
    }
}

fn default_upload_dir() -> String {
    "data/uploads".to_string()
}
