//! Cleanup job behavior over real collaborators.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::time::timeout;

use roomdrop_auth::{Argon2PasswordHasher, JwtTokenService};
use roomdrop_core::ShareResult;
use roomdrop_core::config::{AuthConfig, worker::WorkerConfig};
use roomdrop_core::events::EventName;
use roomdrop_core::types::{FileId, RoomId};
use roomdrop_entity::{
    ExpiredCleanup, Room, RoomFile, RoomRepository, RoomSnapshot, SharePolicy,
};
use roomdrop_realtime::EventBus;
use roomdrop_repository::MemoryRoomRepository;
use roomdrop_service::FileShareService;
use roomdrop_storage::MemoryFileStore;
use roomdrop_worker::RoomCleanupJob;

fn make_service(repo: Arc<dyn RoomRepository>) -> Arc<FileShareService> {
    Arc::new(FileShareService::new(
        repo,
        Arc::new(MemoryFileStore::new()),
        Arc::new(Argon2PasswordHasher::new()),
        Arc::new(JwtTokenService::new(&AuthConfig {
            jwt_secret: "test-secret".to_string(),
        })),
        SharePolicy {
            default_room_ttl: Duration::from_secs(3600),
            default_token_ttl: Duration::from_secs(1800),
            max_files: 0,
            max_room_bytes: 0,
            max_room_lifespan: Duration::from_secs(86400),
            max_token_lifespan: Duration::from_secs(86400),
            upload_dir: "uploads".to_string(),
        },
    ))
}

fn tiny_interval() -> WorkerConfig {
    WorkerConfig {
        enabled: true,
        cleanup_interval_seconds: 1,
    }
}

#[tokio::test(start_paused = true)]
async fn sweep_publishes_room_delete() {
    let repo = Arc::new(MemoryRoomRepository::new());
    let service = make_service(repo.clone());
    let bus = Arc::new(EventBus::new());
    let mut events = bus.subscribe(EventName::RoomDelete);

    // A room that is already past its expiry when the first tick fires.
    let mut room = Room::new("hash", Duration::from_millis(1)).unwrap();
    room.add_token("t1").unwrap();
    let id = room.id();
    repo.create(&room).await.unwrap();
    std::thread::sleep(Duration::from_millis(5));

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = RoomCleanupJob::new(service, bus.clone(), tiny_interval()).spawn(shutdown_rx);

    let event = timeout(Duration::from_secs(10), events.recv())
        .await
        .expect("sweep should publish within the window")
        .unwrap();
    assert_eq!(event.name, EventName::RoomDelete);
    assert!(event.data.to_string().contains(&id.to_string()));

    assert!(repo.get(id).await.unwrap().is_none());
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn stop_is_idempotent() {
    let service = make_service(Arc::new(MemoryRoomRepository::new()));
    let bus = Arc::new(EventBus::new());

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = RoomCleanupJob::new(service, bus, tiny_interval()).spawn(shutdown_rx);

    handle.stop();
    handle.stop();
    timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("job should stop promptly");
}

#[tokio::test(start_paused = true)]
async fn shutdown_channel_stops_the_loop() {
    let service = make_service(Arc::new(MemoryRoomRepository::new()));
    let bus = Arc::new(EventBus::new());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = RoomCleanupJob::new(service, bus, tiny_interval()).spawn(shutdown_rx);

    shutdown_tx.send(true).unwrap();
    timeout(Duration::from_secs(5), handle.shutdown())
        .await
        .expect("job should honor the shutdown channel");
}

/// Repository whose sweep always fails, for exercising the
/// log-and-continue path.
#[derive(Debug, Default)]
struct FailingSweepRepository {
    sweeps: AtomicUsize,
}

#[async_trait]
impl RoomRepository for FailingSweepRepository {
    async fn get(&self, _id: RoomId) -> ShareResult<Option<Room>> {
        Ok(None)
    }
    async fn get_by_token(&self, _id: RoomId, _token: &str) -> ShareResult<Option<Room>> {
        Ok(None)
    }
    async fn list_snapshots(&self) -> ShareResult<Vec<RoomSnapshot>> {
        Ok(Vec::new())
    }
    async fn create(&self, _room: &Room) -> ShareResult<()> {
        Ok(())
    }
    async fn delete(&self, _id: RoomId) -> ShareResult<Vec<String>> {
        Ok(Vec::new())
    }
    async fn delete_expired(&self, _now: DateTime<Utc>) -> ShareResult<Vec<ExpiredCleanup>> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        Err(roomdrop_core::ShareError::internal("sweep exploded"))
    }
    async fn add_token(&self, _id: RoomId, _token: &str) -> ShareResult<()> {
        Ok(())
    }
    async fn remove_token(&self, _id: RoomId, _token: &str) -> ShareResult<bool> {
        Ok(false)
    }
    async fn get_password_hash(&self, _id: RoomId) -> ShareResult<Option<String>> {
        Ok(None)
    }
    async fn add_file_by_token(
        &self,
        _id: RoomId,
        _token: &str,
        _file: &RoomFile,
    ) -> ShareResult<bool> {
        Ok(false)
    }
    async fn delete_file_by_token(
        &self,
        _id: RoomId,
        _file_id: FileId,
        _token: &str,
    ) -> ShareResult<Option<String>> {
        Ok(None)
    }
}

#[tokio::test(start_paused = true)]
async fn failing_sweep_does_not_stop_the_ticker() {
    let repo = Arc::new(FailingSweepRepository::default());
    let service = make_service(repo.clone());
    let bus = Arc::new(EventBus::new());

    let (_shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = RoomCleanupJob::new(service, bus, tiny_interval()).spawn(shutdown_rx);

    // Let several intervals elapse; the ticker must survive every
    // failed sweep.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(repo.sweeps.load(Ordering::SeqCst) >= 2);

    handle.shutdown().await;
}
