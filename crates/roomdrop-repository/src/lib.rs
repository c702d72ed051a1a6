//! # roomdrop-repository
//!
//! Storage backends implementing the [`RoomRepository`] port: an
//! in-memory map for tests and single-node use, PostgreSQL for durable
//! deployments, and Redis for shared ephemeral state.
//!
//! All three give the same external behavior; the contract test suite in
//! `tests/` runs identically against each.
//!
//! [`RoomRepository`]: roomdrop_entity::RoomRepository

pub mod memory;

#[cfg(feature = "postgres")]
pub mod postgres;

#[cfg(feature = "redis-backend")]
pub mod redis;

pub use memory::MemoryRoomRepository;

#[cfg(feature = "postgres")]
pub use postgres::{DatabasePool, PostgresRoomRepository};

#[cfg(feature = "redis-backend")]
pub use redis::{RedisClient, RedisRoomRepository};
