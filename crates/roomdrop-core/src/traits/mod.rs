//! Port traits implemented outside the core.
//!
//! The `RoomRepository` port references the domain entities and is
//! defined next to them in `roomdrop-entity`; the traits here depend
//! only on core types.

pub mod security;
pub mod store;

pub use security::{PasswordHasher, TokenService};
pub use store::{ByteStream, FileStore};
