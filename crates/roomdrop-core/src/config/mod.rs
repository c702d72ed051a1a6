//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod logging;
pub mod repository;
pub mod share;
pub mod storage;
pub mod worker;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::repository::RepositoryConfig;
use self::share::ShareConfig;
use self::storage::StorageConfig;
use self::worker::WorkerConfig;

use crate::error::ShareError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Room repository backend settings.
    #[serde(default)]
    pub repository: RepositoryConfig,
    /// Room/token lifecycle policy settings.
    #[serde(default)]
    pub share: ShareConfig,
    /// File storage settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Background worker settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// JWT signing settings.
    #[serde(default)]
    pub auth: AuthConfig,
}

/// JWT signing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for signing room tokens.
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `ROOMDROP_`.
    pub fn load(env: &str) -> Result<Self, ShareError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("ROOMDROP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| ShareError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| ShareError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

fn default_jwt_secret() -> String {
    "change-me-in-production".to_string()
}
