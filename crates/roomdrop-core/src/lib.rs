//! # roomdrop-core
//!
//! Core crate for Roomdrop. Contains the port traits, configuration
//! schemas, typed identifiers, domain events, and the unified error
//! system shared by every other crate in the workspace.
//!
//! This crate has **no** internal dependencies on other Roomdrop crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{ErrorKind, ShareError};
pub use result::ShareResult;
