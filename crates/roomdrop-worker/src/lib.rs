//! # roomdrop-worker
//!
//! Ticker-driven background job sweeping expired rooms through the
//! service and publishing the results on the event bus.

pub mod cleanup;

pub use cleanup::{CleanupHandle, RoomCleanupJob};
