//! # roomdrop-entity
//!
//! Domain entities for Roomdrop: the [`Room`] aggregate, its attached
//! [`RoomFile`] metadata, the token-redacted [`RoomSnapshot`] projection,
//! the immutable [`SharePolicy`], and the [`RoomRepository`] port the
//! storage backends implement.
//!
//! Everything in this crate is pure in-memory state; no I/O.

pub mod cleanup;
pub mod file;
pub mod policy;
pub mod repository;
pub mod room;
pub mod snapshot;

pub use cleanup::ExpiredCleanup;
pub use file::RoomFile;
pub use policy::SharePolicy;
pub use repository::RoomRepository;
pub use room::Room;
pub use snapshot::RoomSnapshot;
