//! # roomdrop-service
//!
//! [`FileShareService`] orchestrates rooms, blobs, password hashing, and
//! token issuance under a single [`SharePolicy`]. It is the only place
//! where authorization and quota rules are enforced.
//!
//! [`SharePolicy`]: roomdrop_entity::SharePolicy

pub mod service;

pub use service::{CleanupReport, FileShareService};
