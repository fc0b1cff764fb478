//! Persistence of batch sessions.
//!
//! The engine never locks: callers serialize mutations per session through
//! [`SessionStore::persist_if_unchanged`], which rejects a write when the
//! stored revision moved since the session was loaded.

mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use uuid::Uuid;

use crate::error::{Result, WorkflowError};
use crate::workflow::BatchSession;

pub trait SessionStore {
    /// Store a new session. The stored copy (revision 1) is returned.
    fn insert(&self, session: BatchSession) -> Result<BatchSession>;

    /// Load the current stored state, or `NotFound`.
    fn load(&self, id: Uuid) -> Result<BatchSession>;

    /// Replace `previous` with `next` if nobody else wrote in between.
    /// The stored copy, with its bumped revision, is returned.
    fn persist_if_unchanged(
        &self,
        previous: &BatchSession,
        next: BatchSession,
    ) -> Result<BatchSession>;

    /// All stored sessions, oldest first.
    fn list(&self) -> Result<Vec<BatchSession>>;
}

pub(crate) fn check_revision(
    previous: &BatchSession,
    next: &BatchSession,
    stored_revision: u64,
) -> Result<()> {
    if previous.id != next.id {
        return Err(WorkflowError::InvalidArgument(format!(
            "cannot persist session {} over session {}",
            next.id, previous.id
        )));
    }
    if stored_revision != previous.revision {
        return Err(WorkflowError::VersionConflict {
            session_id: previous.id,
            expected: previous.revision,
            found: stored_revision,
        });
    }
    Ok(())
}
