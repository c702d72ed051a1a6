//! Periodic expiry sweep.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use roomdrop_core::config::worker::WorkerConfig;
use roomdrop_core::events::Event;
use roomdrop_realtime::EventBus;
use roomdrop_service::FileShareService;

/// Background job calling the service's expiry sweep on a fixed
/// interval and publishing one `RoomDelete` event per sweep that
/// removed at least one room.
///
/// A failing sweep is logged and the ticker keeps running; only the
/// stop signal or shutdown channel ends the loop.
pub struct RoomCleanupJob {
    service: Arc<FileShareService>,
    bus: Arc<EventBus>,
    config: WorkerConfig,
}

impl RoomCleanupJob {
    pub fn new(service: Arc<FileShareService>, bus: Arc<EventBus>, config: WorkerConfig) -> Self {
        Self {
            service,
            bus,
            config,
        }
    }

    /// Spawn the job onto the runtime.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> CleanupHandle {
        let stop = CancellationToken::new();
        let task_stop = stop.clone();
        let handle = tokio::spawn(async move { self.run(shutdown, task_stop).await });
        CleanupHandle { stop, handle }
    }

    /// Run until the shutdown channel flips or `stop` fires.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>, stop: CancellationToken) {
        let interval = Duration::from_secs(self.config.cleanup_interval_seconds);
        info!(interval_seconds = interval.as_secs(), "Cleanup job started");

        let mut ticker = time::interval(interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick fires immediately; sweeps should start one full
        // interval after startup.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => self.sweep().await,
            }
        }

        info!("Cleanup job stopped");
    }

    async fn sweep(&self) {
        match self.service.cleanup_expired(Utc::now()).await {
            Ok(report) => {
                if let Some(error) = &report.error {
                    warn!(error = %error, "Sweep completed with blob deletion failures");
                }
                if !report.removed.is_empty() {
                    self.bus.publish(Event::room_delete(&report.removed));
                }
            }
            Err(e) => warn!(error = %e, "Expiry sweep failed"),
        }
    }
}

/// Handle to a spawned cleanup job.
pub struct CleanupHandle {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

impl CleanupHandle {
    /// Signal the job to stop. Idempotent; safe to call concurrently.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Stop the job and wait for the loop to exit.
    pub async fn shutdown(self) {
        self.stop.cancel();
        let _ = self.handle.await;
    }
}
