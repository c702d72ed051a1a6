//! Convenience result type alias for Roomdrop.

use crate::error::ShareError;

/// A specialized `Result` type for Roomdrop operations.
pub type ShareResult<T> = Result<T, ShareError>;
