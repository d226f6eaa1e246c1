//! Error types for Devstore commands.

use devstore_state::StateError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for core operations.
pub type DevstoreResult<T> = Result<T, DevstoreError>;

/// Errors surfaced to callers of the command interface.
///
/// Every error is terminal for the command it occurs in. Storage failures
/// are wrapped so that their `Display` output never exposes engine detail;
/// the underlying cause stays reachable through `source()`.
#[derive(Debug, Error)]
pub enum DevstoreError {
    #[error("no developer key provided")]
    MissingDeveloperKey,

    #[error("invalid developer key")]
    InvalidDeveloperKey,

    #[error("developer key {0} is already registered with different metadata")]
    AlreadyRegistered(String),

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("key is required for {0}")]
    MissingKey(&'static str),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("storage unavailable")]
    StorageUnavailable(#[from] StateError),
}

impl DevstoreError {
    pub(crate) fn not_found(what: &'static str, key: &str) -> Self {
        Self::NotFound {
            what,
            key: key.to_string(),
        }
    }

    /// The stable kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingDeveloperKey => ErrorKind::MissingDeveloperKey,
            Self::InvalidDeveloperKey => ErrorKind::InvalidDeveloperKey,
            Self::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::MissingKey(_) => ErrorKind::MissingKey,
            Self::MissingField(_) => ErrorKind::MissingField,
            Self::InvalidCredentials => ErrorKind::InvalidCredentials,
            Self::UnsupportedCommand(_) => ErrorKind::UnsupportedCommand,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
        }
    }
}

/// Error classification carried in error responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    MissingDeveloperKey,
    InvalidDeveloperKey,
    AlreadyRegistered,
    NotFound,
    MissingKey,
    MissingField,
    InvalidCredentials,
    UnsupportedCommand,
    StorageUnavailable,
}

impl ErrorKind {
    /// HTTP status the transport layer should answer with.
    pub fn http_status_hint(self) -> u16 {
        match self {
            Self::MissingKey | Self::MissingField => 400,
            Self::MissingDeveloperKey | Self::InvalidCredentials => 401,
            Self::InvalidDeveloperKey => 403,
            Self::NotFound => 404,
            Self::UnsupportedCommand => 405,
            Self::AlreadyRegistered => 409,
            Self::StorageUnavailable => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn storage_detail_is_hidden() {
        let err = DevstoreError::from(StateError::Open("/var/lib/x: permission denied".into()));
        assert_eq!(err.to_string(), "storage unavailable");
        assert_eq!(err.kind(), ErrorKind::StorageUnavailable);
        assert!(err.source().is_some());
    }

    #[test]
    fn status_hints() {
        assert_eq!(DevstoreError::MissingKey("deletion").kind().http_status_hint(), 400);
        assert_eq!(DevstoreError::not_found("record", "k").kind().http_status_hint(), 404);
        assert_eq!(DevstoreError::InvalidCredentials.kind().http_status_hint(), 401);
        assert_eq!(DevstoreError::InvalidDeveloperKey.kind().http_status_hint(), 403);
        assert_eq!(
            DevstoreError::UnsupportedCommand("PATCH".into()).kind().http_status_hint(),
            405
        );
    }

    #[test]
    fn kind_serializes_as_code() {
        let json = serde_json::to_string(&ErrorKind::InvalidDeveloperKey).unwrap();
        assert_eq!(json, "\"INVALID_DEVELOPER_KEY\"");
    }
}
