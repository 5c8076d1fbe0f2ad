//! Error types for the session crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StorageError`: Failures of the durable key-value store
//! - `SessionError`: Failures establishing a session
//! - `AccessDenied`: Guard refusals for protected navigation

use std::fmt;

/// Errors from durable key-value storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// Reading a key failed.
    ReadFailed { key: String, details: String },
    /// Writing a key failed.
    WriteFailed { key: String, details: String },
    /// Deleting a key failed.
    DeleteFailed { key: String, details: String },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFailed { key, details } => {
                write!(f, "failed to read '{key}': {details}")
            }
            Self::WriteFailed { key, details } => {
                write!(f, "failed to write '{key}': {details}")
            }
            Self::DeleteFailed { key, details } => {
                write!(f, "failed to delete '{key}': {details}")
            }
        }
    }
}

impl std::error::Error for StorageError {}

/// Errors from session mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The credential handed to `establish` was empty.
    EmptyToken,
    /// The user profile could not be serialized for storage.
    Serialization { details: String },
    /// The session record could not be written; storage was rolled back.
    Persistence { details: String },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyToken => write!(f, "session token must not be empty"),
            Self::Serialization { details } => {
                write!(f, "failed to serialize user profile: {details}")
            }
            Self::Persistence { details } => {
                write!(f, "failed to persist session: {details}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

/// Reasons a guard refuses entry to a protected area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    /// Nobody is logged in.
    Unauthenticated,
    /// The logged-in user lacks the required role.
    Forbidden,
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "user is not authenticated"),
            Self::Forbidden => write!(f, "user lacks the required role"),
        }
    }
}

impl std::error::Error for AccessDenied {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_display() {
        let err = StorageError::WriteFailed {
            key: "token".to_string(),
            details: "disk full".to_string(),
        };
        assert!(err.to_string().contains("token"));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn session_error_empty_token_display() {
        assert!(SessionError::EmptyToken.to_string().contains("empty"));
    }

    #[test]
    fn session_error_persistence_display() {
        let err = SessionError::Persistence {
            details: "read-only".to_string(),
        };
        assert!(err.to_string().contains("persist"));
        assert!(err.to_string().contains("read-only"));
    }

    #[test]
    fn access_denied_display() {
        assert!(AccessDenied::Unauthenticated.to_string().contains("not authenticated"));
        assert!(AccessDenied::Forbidden.to_string().contains("role"));
    }
}
