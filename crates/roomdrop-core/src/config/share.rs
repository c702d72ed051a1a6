//! Room/token lifecycle policy configuration.

use serde::{Deserialize, Serialize};

/// Policy bounds for room and token lifecycles.
///
/// These values are read once at process start and frozen into a
/// `SharePolicy` passed to the service; they are never re-read at runtime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Room lifespan applied when a create request does not specify one,
    /// in seconds.
    #[serde(default = "default_room_ttl")]
    pub default_room_ttl_seconds: u64,
    /// Token lifespan applied when an auth request does not specify one,
    /// in seconds.
    #[serde(default = "default_token_ttl")]
    pub default_token_ttl_seconds: u64,
    /// Maximum number of files per room (0 = unlimited).
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Maximum total bytes per room (0 = unlimited).
    #[serde(default = "default_max_room_bytes")]
    pub max_room_bytes: u64,
    /// Upper bound for a caller-requested room lifespan, in seconds
    /// (0 = unbounded).
    #[serde(default = "default_max_room_lifespan")]
    pub max_room_lifespan_seconds: u64,
    /// Upper bound for a caller-requested token lifespan, in seconds
    /// (0 = unbounded).
    #[serde(default = "default_max_token_lifespan")]
    pub max_token_lifespan_seconds: u64,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            default_room_ttl_seconds: default_room_ttl(),
            default_token_ttl_seconds: default_token_ttl(),
            max_files: default_max_files(),
            max_room_bytes: default_max_room_bytes(),
            max_room_lifespan_seconds: default_max_room_lifespan(),
            max_token_lifespan_seconds: default_max_token_lifespan(),
        }
    }
}

fn default_room_ttl() -> u64 {
    3600
}

fn default_token_ttl() -> u64 {
    1800
}

fn default_max_files() -> usize {
    100
}

fn default_max_room_bytes() -> u64 {
    1024 * 1024 * 1024
}

fn default_max_room_lifespan() -> u64 {
    24 * 3600
}

fn default_max_token_lifespan() -> u64 {
    24 * 3600
}
