use thiserror::Error;
use uuid::Uuid;

use crate::workflow::SessionStatus;

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Cannot {operation} a session that is {status}")]
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },

    #[error("Invalid {entity} transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    #[error("No pending visit left in this session")]
    NoPendingVisit,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session {session_id} was modified (expected revision {expected}, found {found})")]
    VersionConflict {
        session_id: Uuid,
        expected: u64,
        found: u64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkflowError {
    pub(crate) fn invalid_state(operation: &'static str, status: SessionStatus) -> Self {
        WorkflowError::InvalidState { operation, status }
    }

    pub(crate) fn session_not_found(id: Uuid) -> Self {
        WorkflowError::NotFound(format!("session {id}"))
    }

    pub(crate) fn entry_not_found(id: Uuid) -> Self {
        WorkflowError::NotFound(format!("visit entry {id}"))
    }
}

pub type Result<T> = std::result::Result<T, WorkflowError>;
