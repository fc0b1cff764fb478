//! JSON-file session store.
//!
//! One pretty-printed document per session under `<root>/sessions/`, with:
//! - Optimistic concurrency via a per-session exclusive lock file
//! - Atomic writes via temp file + rename

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use uuid::Uuid;

use super::{SessionStore, check_revision};
use crate::error::{Result, WorkflowError};
use crate::workflow::BatchSession;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `root`.
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join("sessions");
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn document_path(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }

    /// Hold the returned file to keep the session locked; dropping it unlocks.
    fn lock(&self, id: Uuid) -> Result<File> {
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.dir.join(format!("{id}.lock")))?;
        file.lock_exclusive()?;
        Ok(file)
    }

    fn read(&self, id: Uuid) -> Result<Option<BatchSession>> {
        match std::fs::read_to_string(self.document_path(id)) {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, session: &BatchSession) -> Result<()> {
        let path = self.document_path(session.id);
        let content = serde_json::to_string_pretty(session)?;

        // Write to temp file, then rename for atomicity
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, content)?;
        std::fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

impl SessionStore for FileStore {
    fn insert(&self, mut session: BatchSession) -> Result<BatchSession> {
        let _guard = self.lock(session.id)?;
        if self.read(session.id)?.is_some() {
            return Err(WorkflowError::InvalidArgument(format!(
                "session {} already exists",
                session.id
            )));
        }
        session.revision = 1;
        self.write(&session)?;
        Ok(session)
    }

    fn load(&self, id: Uuid) -> Result<BatchSession> {
        self.read(id)?
            .ok_or_else(|| WorkflowError::session_not_found(id))
    }

    fn persist_if_unchanged(
        &self,
        previous: &BatchSession,
        mut next: BatchSession,
    ) -> Result<BatchSession> {
        let _guard = self.lock(previous.id)?;
        let stored = self
            .read(previous.id)?
            .ok_or_else(|| WorkflowError::session_not_found(previous.id))?;
        check_revision(previous, &next, stored.revision)?;

        next.revision = previous.revision + 1;
        self.write(&next)?;
        Ok(next)
    }

    fn list(&self) -> Result<Vec<BatchSession>> {
        let mut all = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let content = std::fs::read_to_string(&path)?;
            all.push(serde_json::from_str::<BatchSession>(&content)?);
        }
        all.sort_by_key(|s| s.created_at);
        Ok(all)
    }
}
