//! Roomdrop server.
//!
//! Wires the repository backend, file store, auth adapters, service,
//! event bus, and cleanup worker together and runs until a shutdown
//! signal arrives.

use std::sync::Arc;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use roomdrop_auth::{Argon2PasswordHasher, JwtTokenService};
use roomdrop_core::ShareError;
use roomdrop_core::config::AppConfig;
use roomdrop_core::events::EventName;
use roomdrop_core::traits::FileStore;
use roomdrop_entity::{RoomRepository, SharePolicy};
use roomdrop_realtime::EventBus;
use roomdrop_repository::{DatabasePool, MemoryRoomRepository, RedisClient};
use roomdrop_service::FileShareService;
use roomdrop_storage::DiskFileStore;
use roomdrop_worker::RoomCleanupJob;

#[tokio::main]
async fn main() {
    let env = std::env::var("ROOMDROP_ENV").unwrap_or_else(|_| "development".to_string());
    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    }
}

/// Initialize tracing from the logging section.
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), ShareError> {
    tracing::info!("Starting Roomdrop v{}", env!("CARGO_PKG_VERSION"));

    // ── Step 1: Repository backend ───────────────────────────────
    let repo = select_repository(&config).await?;

    // ── Step 2: File store ───────────────────────────────────────
    let upload_dir = config.storage.upload_dir.clone();
    tokio::fs::create_dir_all(&upload_dir).await.map_err(|e| {
        ShareError::storage(format!("Failed to create upload dir '{upload_dir}'"), e)
    })?;
    let store = Arc::new(DiskFileStore::new());
    if config.storage.clear_on_start {
        tracing::info!(%upload_dir, "Clearing upload directory");
        store.clear_all(&upload_dir).await?;
    }

    // ── Step 3: Auth adapters ────────────────────────────────────
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let tokens = Arc::new(JwtTokenService::new(&config.auth));

    // ── Step 4: Service ──────────────────────────────────────────
    let policy = SharePolicy::from_config(&config.share, &config.storage.upload_dir);
    let service = Arc::new(FileShareService::new(repo, store, hasher, tokens, policy));

    // ── Step 5: Event bus ────────────────────────────────────────
    let bus = Arc::new(EventBus::new());
    let mut room_deletes = bus.subscribe(EventName::RoomDelete);
    tokio::spawn(async move {
        while let Some(event) = room_deletes.recv().await {
            tracing::info!(rooms = %event.data, "Rooms removed by expiry sweep");
        }
    });

    // ── Step 6: Cleanup worker ───────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let cleanup = if config.worker.enabled {
        let job = RoomCleanupJob::new(service.clone(), bus.clone(), config.worker.clone());
        Some(job.spawn(shutdown_rx))
    } else {
        tracing::warn!("Cleanup worker disabled; expired rooms will not be swept");
        None
    };

    tracing::info!(backend = %config.repository.backend, "Roomdrop ready");

    wait_for_shutdown().await;

    tracing::info!("Shutdown signal received, stopping...");
    let _ = shutdown_tx.send(true);
    if let Some(handle) = cleanup {
        handle.shutdown().await;
    }
    tracing::info!("Shutdown complete");

    Ok(())
}

/// Build the repository named by `repository.backend`.
async fn select_repository(config: &AppConfig) -> Result<Arc<dyn RoomRepository>, ShareError> {
    match config.repository.backend.as_str() {
        "memory" => {
            tracing::info!("Using in-memory room repository");
            Ok(Arc::new(MemoryRoomRepository::new()))
        }
        "postgres" => {
            tracing::info!("Connecting to PostgreSQL...");
            let pool = DatabasePool::connect(&config.repository.database).await?;
            roomdrop_repository::postgres::run_migrations(pool.pool()).await?;
            tracing::info!("Database migrations complete");
            Ok(Arc::new(roomdrop_repository::PostgresRoomRepository::new(
                pool.into_pool(),
            )))
        }
        "redis" => {
            tracing::info!("Connecting to Redis...");
            let client = RedisClient::connect(&config.repository.redis).await?;
            Ok(Arc::new(roomdrop_repository::RedisRoomRepository::new(
                client,
            )))
        }
        other => Err(ShareError::configuration(format!(
            "Unknown repository backend '{other}' (expected memory, postgres, or redis)"
        ))),
    }
}

/// Resolve on ctrl-c or, on unix, SIGTERM.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
