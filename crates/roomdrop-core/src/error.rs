//! Unified application error types for Roomdrop.
//!
//! All crates map their internal errors into [`ShareError`] for consistent
//! propagation through the ? operator. Domain failures are distinct
//! variants so callers can match on them; backend failures carry the
//! underlying cause as a `#[source]` and are propagated unwrapped; retry
//! policy, if any, belongs to the caller.

use std::fmt;

use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
///
/// Absent rooms and wrong tokens both map to [`ErrorKind::NotFound`] so
/// that transports cannot be used as an existence-probing oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The requested resource was not found.
    NotFound,
    /// Authentication failed (wrong password, invalid or expired token).
    Authentication,
    /// Input validation failed.
    Validation,
    /// A conflict occurred (duplicate room id, transfer code in use).
    Conflict,
    /// A policy quota would be exceeded.
    Quota,
    /// The operation was cancelled.
    Cancelled,
    /// A database error occurred.
    Database,
    /// A key-value store error occurred.
    Cache,
    /// A storage I/O error occurred.
    Storage,
    /// A configuration error occurred.
    Configuration,
    /// An internal error occurred.
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Authentication => write!(f, "AUTHENTICATION"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Conflict => write!(f, "CONFLICT"),
            Self::Quota => write!(f, "QUOTA"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Database => write!(f, "DATABASE"),
            Self::Cache => write!(f, "CACHE"),
            Self::Storage => write!(f, "STORAGE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Internal => write!(f, "INTERNAL"),
        }
    }
}

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// The unified application error used throughout Roomdrop.
#[derive(Debug, Error)]
pub enum ShareError {
    // ── Validation ─────────────────────────────────────────────
    #[error("password is empty")]
    EmptyPassword,
    #[error("password hash is empty")]
    EmptyPasswordHash,
    #[error("token is empty")]
    EmptyToken,
    #[error("filename is empty")]
    EmptyFilename,
    #[error("room lifespan must be positive")]
    InvalidRoomTtl,
    #[error("room lifespan too long")]
    RoomLifespanTooLong,
    #[error("token lifespan too long")]
    TokenLifespanTooLong,
    #[error("invalid file")]
    InvalidFile,
    #[error("transfer code invalid length")]
    TransferCodeInvalidLength,

    // ── Not found ──────────────────────────────────────────────
    #[error("room not found")]
    RoomNotFound,
    #[error("file not found")]
    FileNotFound,
    #[error("token not found")]
    TokenNotFound,
    #[error("transfer code not found")]
    TransferCodeNotFound,

    // ── Authentication ─────────────────────────────────────────
    #[error("invalid password")]
    InvalidPassword,
    #[error("token invalid")]
    InvalidToken,
    #[error("token expired")]
    TokenExpired,
    #[error("token room mismatch")]
    TokenRoomMismatch,

    // ── Conflict ───────────────────────────────────────────────
    #[error("room already exists")]
    RoomAlreadyExists,
    #[error("transfer code already in use")]
    TransferCodeExists,

    // ── Quota ──────────────────────────────────────────────────
    #[error("room file limit reached")]
    TooManyFiles,
    #[error("room storage quota exceeded")]
    RoomQuotaExceeded,

    // ── Cancellation ───────────────────────────────────────────
    #[error("operation cancelled")]
    Cancelled,

    // ── Transient / backend ────────────────────────────────────
    #[error("database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
    #[error("key-value store error: {message}")]
    Cache {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("internal error: {message}")]
    Internal { message: String },

    /// Accumulated best-effort cleanup failures. The operation that
    /// produced this error still completed; the messages are kept for
    /// observability only.
    #[error("cleanup incomplete: {0}")]
    CleanupIncomplete(String),
}

impl ShareError {
    /// Create a database error with an underlying cause.
    pub fn database(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Database {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a key-value store error with an underlying cause.
    pub fn cache(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Cache {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a storage error with an underlying cause.
    pub fn storage(message: impl Into<String>, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Join accumulated cleanup failures into a single error.
    ///
    /// Returns `None` when the list is empty, so callers can write
    /// `ShareError::join_cleanup(errors).map_or(Ok(()), Err)`.
    pub fn join_cleanup(errors: Vec<ShareError>) -> Option<ShareError> {
        if errors.is_empty() {
            return None;
        }
        let joined = errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        Some(ShareError::CleanupIncomplete(joined))
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyPassword
            | Self::EmptyPasswordHash
            | Self::EmptyToken
            | Self::EmptyFilename
            | Self::InvalidRoomTtl
            | Self::RoomLifespanTooLong
            | Self::TokenLifespanTooLong
            | Self::InvalidFile
            | Self::TransferCodeInvalidLength => ErrorKind::Validation,

            Self::RoomNotFound
            | Self::FileNotFound
            | Self::TokenNotFound
            | Self::TransferCodeNotFound => ErrorKind::NotFound,

            Self::InvalidPassword
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::TokenRoomMismatch => ErrorKind::Authentication,

            Self::RoomAlreadyExists | Self::TransferCodeExists => ErrorKind::Conflict,

            Self::TooManyFiles | Self::RoomQuotaExceeded => ErrorKind::Quota,

            Self::Cancelled => ErrorKind::Cancelled,

            Self::Database { .. } => ErrorKind::Database,
            Self::Cache { .. } => ErrorKind::Cache,
            Self::Storage { .. } | Self::CleanupIncomplete(_) => ErrorKind::Storage,
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Whether this error belongs to the NotFound category.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<std::io::Error> for ShareError {
    fn from(err: std::io::Error) -> Self {
        Self::storage(format!("I/O error: {err}"), err)
    }
}

impl From<serde_json::Error> for ShareError {
    fn from(err: serde_json::Error) -> Self {
        Self::cache(format!("JSON serialization error: {err}"), err)
    }
}

impl From<config::ConfigError> for ShareError {
    fn from(err: config::ConfigError) -> Self {
        Self::configuration(format!("{err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_class_is_uniform() {
        assert_eq!(ShareError::RoomNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ShareError::TokenNotFound.kind(), ErrorKind::NotFound);
        assert_eq!(ShareError::FileNotFound.kind(), ErrorKind::NotFound);
        assert!(ShareError::RoomNotFound.is_not_found());
    }

    #[test]
    fn join_cleanup_empty_is_none() {
        assert!(ShareError::join_cleanup(Vec::new()).is_none());
    }

    #[test]
    fn join_cleanup_concatenates_messages() {
        let joined = ShareError::join_cleanup(vec![
            ShareError::FileNotFound,
            ShareError::internal("boom"),
        ])
        .unwrap();
        let text = joined.to_string();
        assert!(text.contains("file not found"));
        assert!(text.contains("boom"));
    }
}
