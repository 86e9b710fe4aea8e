use thiserror::Error;

use crate::security::ValidationError;

/// Every failure the backend can report to the presentation layer.
///
/// The `Display` text is what ends up in the `error` field of a failure
/// envelope, so engine messages are carried through unchanged.
#[derive(Debug, Error)]
pub enum AuditError {
    /// Authentication, network or connect-timeout failure.
    #[error("{0}")]
    Connection(String),

    /// An operation needed the session but none is open.
    #[error("Not connected")]
    NotConnected,

    /// The engine rejected a statement (syntax, permission, missing object, timeout).
    #[error("{0}")]
    Query(String),

    /// The user dismissed the folder picker.
    #[error("Folder selection cancelled")]
    Cancelled,

    /// A name or path could not be embedded safely.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A result row did not have the expected shape.
    #[error("Unexpected result row: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AuditError>;
