pub mod audit;
pub mod connection;
pub mod dialog;
pub mod handlers;
pub mod schema;

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::db::session::SessionManager;
use crate::error::AuditError;

/// Managed state holding the single session.
pub type SessionState = Arc<Mutex<SessionManager>>;

/// Uniform response sent back for every command.
///
/// Serializes as `{ "success": true, ...payload }` or
/// `{ "success": false, "error": "..." }`. A cancelled folder pick is
/// `{ "success": false }` with no error text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub payload: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(message.into()),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            success: false,
            payload: None,
            error: None,
        }
    }

    pub fn from_result(result: Result<T, AuditError>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(AuditError::Cancelled) => Self::cancelled(),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

/// Payload for commands that only report success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ack {}

/// Payload for commands that return a list under `data`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Data<T: Serialize> {
    pub data: T,
}
