//! In-memory room storage.

mod store;

pub use store::MemoryRoomRepository;
