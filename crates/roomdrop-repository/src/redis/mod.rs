//! Redis room storage.

mod client;
mod keys;
mod repository;

pub use client::RedisClient;
pub use repository::RedisRoomRepository;
