use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WorkflowError};

/// Lifecycle status of a batch session.
///
/// Each session flows through: DRAFT → IN_PROGRESS → COMPLETED | CANCELLED
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Draft,
    InProgress,
    Completed,
    Cancelled,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Draft => write!(f, "DRAFT"),
            SessionStatus::InProgress => write!(f, "IN_PROGRESS"),
            SessionStatus::Completed => write!(f, "COMPLETED"),
            SessionStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// Status of a single visit entry. Both non-pending states are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VisitStatus {
    Pending,
    Completed,
    Cancelled,
}

impl VisitStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, VisitStatus::Pending)
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisitStatus::Pending => write!(f, "PENDING"),
            VisitStatus::Completed => write!(f, "COMPLETED"),
            VisitStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// How an operator ends an in-progress session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinishOutcome {
    Completed,
    Cancelled,
}

impl From<FinishOutcome> for SessionStatus {
    fn from(outcome: FinishOutcome) -> Self {
        match outcome {
            FinishOutcome::Completed => SessionStatus::Completed,
            FinishOutcome::Cancelled => SessionStatus::Cancelled,
        }
    }
}

/// The legal transition graphs for sessions and visit entries.
pub struct StateMachine;

impl StateMachine {
    /// Check a session transition requested by `operation`.
    ///
    /// - Leaving a terminal status, or re-entering `Draft`, is an
    ///   `InvalidTransition`.
    /// - A legal target requested from the wrong live status (a second
    ///   `start`, finishing a draft) is an `InvalidState`.
    pub fn session(
        operation: &'static str,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<SessionStatus> {
        if from.is_terminal() || to == SessionStatus::Draft {
            return Err(WorkflowError::InvalidTransition {
                entity: "session",
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        match (from, to) {
            (SessionStatus::Draft, SessionStatus::InProgress)
            | (SessionStatus::InProgress, SessionStatus::Completed)
            | (SessionStatus::InProgress, SessionStatus::Cancelled) => Ok(to),
            _ => Err(WorkflowError::invalid_state(operation, from)),
        }
    }

    /// Check a visit entry transition. Only `Pending` entries may move, and
    /// never back to `Pending`.
    pub fn visit(from: VisitStatus, to: VisitStatus) -> Result<VisitStatus> {
        match (from, to) {
            (VisitStatus::Pending, VisitStatus::Completed)
            | (VisitStatus::Pending, VisitStatus::Cancelled) => Ok(to),
            _ => Err(WorkflowError::InvalidTransition {
                entity: "visit",
                from: from.to_string(),
                to: to.to_string(),
            }),
        }
    }
}
