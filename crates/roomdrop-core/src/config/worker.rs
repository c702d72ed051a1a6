//! Background worker configuration.

use serde::{Deserialize, Serialize};

/// Room cleanup worker configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Whether the cleanup worker is enabled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between expiry sweeps.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_seconds: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_interval_seconds: default_cleanup_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cleanup_interval() -> u64 {
    60
}
