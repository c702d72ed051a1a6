//! Immutable policy bounding room and token lifecycles.

use std::time::Duration;

use roomdrop_core::config::share::ShareConfig;

/// Policy values constructed once at process start and read-only
/// thereafter. Zero means "unbounded" for the maxima and quotas.
#[derive(Debug, Clone)]
pub struct SharePolicy {
    pub default_room_ttl: Duration,
    pub default_token_ttl: Duration,
    pub max_files: usize,
    pub max_room_bytes: u64,
    pub max_room_lifespan: Duration,
    pub max_token_lifespan: Duration,
    pub upload_dir: String,
}

impl SharePolicy {
    /// Freeze the configuration section into a policy.
    pub fn from_config(config: &ShareConfig, upload_dir: impl Into<String>) -> Self {
        Self {
            default_room_ttl: Duration::from_secs(config.default_room_ttl_seconds),
            default_token_ttl: Duration::from_secs(config.default_token_ttl_seconds),
            max_files: config.max_files,
            max_room_bytes: config.max_room_bytes,
            max_room_lifespan: Duration::from_secs(config.max_room_lifespan_seconds),
            max_token_lifespan: Duration::from_secs(config.max_token_lifespan_seconds),
            upload_dir: upload_dir.into(),
        }
    }
}
