//! # roomdrop-storage
//!
//! [`FileStore`] implementations: [`DiskFileStore`] streams blobs to the
//! local filesystem, [`MemoryFileStore`] holds them in process memory
//! for tests.
//!
//! [`FileStore`]: roomdrop_core::traits::FileStore

pub mod local;
pub mod memory;

pub use local::DiskFileStore;
pub use memory::MemoryFileStore;
