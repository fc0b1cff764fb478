use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use uuid::Uuid;

use super::{SessionStore, check_revision};
use crate::error::{Result, WorkflowError};
use crate::workflow::BatchSession;

/// In-process store, used by tests and embedders without a database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<HashMap<Uuid, BatchSession>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<Uuid, BatchSession>> {
        // Writers swap whole sessions, so a poisoned map is still consistent.
        self.sessions.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl SessionStore for MemoryStore {
    fn insert(&self, mut session: BatchSession) -> Result<BatchSession> {
        let mut sessions = self.sessions();
        if sessions.contains_key(&session.id) {
            return Err(WorkflowError::InvalidArgument(format!(
                "session {} already exists",
                session.id
            )));
        }
        session.revision = 1;
        sessions.insert(session.id, session.clone());
        Ok(session)
    }

    fn load(&self, id: Uuid) -> Result<BatchSession> {
        self.sessions()
            .get(&id)
            .cloned()
            .ok_or_else(|| WorkflowError::session_not_found(id))
    }

    fn persist_if_unchanged(
        &self,
        previous: &BatchSession,
        mut next: BatchSession,
    ) -> Result<BatchSession> {
        let mut sessions = self.sessions();
        let stored = sessions
            .get(&previous.id)
            .ok_or_else(|| WorkflowError::session_not_found(previous.id))?;
        check_revision(previous, &next, stored.revision)?;

        next.revision = previous.revision + 1;
        sessions.insert(next.id, next.clone());
        Ok(next)
    }

    fn list(&self) -> Result<Vec<BatchSession>> {
        let mut all: Vec<BatchSession> = self.sessions().values().cloned().collect();
        all.sort_by_key(|s| s.created_at);
        Ok(all)
    }
}
