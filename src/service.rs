//! Drives batch sessions through their workflow on behalf of a caller.
//!
//! Every mutation is load → apply on a copy → persist-if-unchanged. A failed
//! operation never reaches the store, and a concurrent writer surfaces as
//! `VersionConflict` instead of being overwritten.

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::Result;
use crate::sites::SiteDirectory;
use crate::store::SessionStore;
use crate::workflow::{BatchSession, FinishOutcome, ProgressSnapshot, RenamePolicy};

/// Source of "now" for timestamps and ETA computation.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct WorkflowService<S, D, C = SystemClock> {
    store: S,
    sites: D,
    clock: C,
    rename_policy: RenamePolicy,
}

impl<S, D, C> WorkflowService<S, D, C>
where
    S: SessionStore,
    D: SiteDirectory,
    C: Clock,
{
    pub fn new(store: S, sites: D, clock: C, rename_policy: RenamePolicy) -> Self {
        Self {
            store,
            sites,
            clock,
            rename_policy,
        }
    }

    /// Validate the input, then the hives against the apiary, and store a
    /// new draft.
    pub fn create(
        &self,
        site_group_id: &str,
        name: &str,
        site_ids: &[String],
    ) -> Result<BatchSession> {
        let session = BatchSession::create(site_group_id, name, site_ids, self.clock.now())
            .and_then(|session| {
                self.sites
                    .validate_sites(site_group_id, site_ids)
                    .map(|()| session)
            })
            .inspect_err(|e| warn!(apiary = site_group_id, error = %e, "create rejected"))?;

        let stored = self.store.insert(session)?;
        info!(
            session_id = %stored.id,
            apiary = %stored.site_group_id,
            hives = stored.visits.len(),
            "session created"
        );
        Ok(stored)
    }

    pub fn load(&self, id: Uuid) -> Result<BatchSession> {
        debug!(session_id = %id, "loading session");
        self.store.load(id)
    }

    pub fn list(&self) -> Result<Vec<BatchSession>> {
        self.store.list()
    }

    pub fn progress(&self, id: Uuid) -> Result<ProgressSnapshot> {
        Ok(self.load(id)?.progress(self.clock.now()))
    }

    pub fn rename(&self, id: Uuid, name: &str) -> Result<BatchSession> {
        let policy = self.rename_policy;
        self.apply(id, "rename", |s, _| s.rename(name, policy)).map(|(s, ())| s)
    }

    pub fn reorder(&self, id: Uuid, new_order: &[(Uuid, i64)]) -> Result<BatchSession> {
        self.apply(id, "reorder", |s, _| s.reorder(new_order)).map(|(s, ())| s)
    }

    pub fn start(&self, id: Uuid) -> Result<BatchSession> {
        self.apply(id, "start", |s, now| s.start(now)).map(|(s, ())| s)
    }

    /// Returns the updated session and the id of the completed entry.
    pub fn complete_current_visit(
        &self,
        id: Uuid,
        record_id: &str,
    ) -> Result<(BatchSession, Uuid)> {
        self.apply(id, "complete_current_visit", |s, now| {
            s.complete_current_visit(record_id, now)
        })
    }

    pub fn cancel_visit(&self, id: Uuid, entry_id: Uuid) -> Result<BatchSession> {
        self.apply(id, "cancel_visit", |s, _| s.cancel_visit(entry_id)).map(|(s, ())| s)
    }

    /// Returns the updated session and the id of the skipped entry.
    pub fn skip_current_visit(&self, id: Uuid) -> Result<(BatchSession, Uuid)> {
        self.apply(id, "skip_current_visit", |s, _| s.skip_current_visit())
    }

    pub fn finish(&self, id: Uuid, outcome: FinishOutcome) -> Result<BatchSession> {
        self.apply(id, "finish", |s, now| s.finish(outcome, now)).map(|(s, ())| s)
    }

    fn apply<T>(
        &self,
        id: Uuid,
        operation: &'static str,
        f: impl FnOnce(&mut BatchSession, DateTime<Utc>) -> Result<T>,
    ) -> Result<(BatchSession, T)> {
        let previous = self.load(id)?;
        let mut next = previous.clone();

        let output = f(&mut next, self.clock.now()).inspect_err(|e| {
            warn!(session_id = %id, operation, error = %e, "operation rejected");
        })?;

        let saved = self
            .store
            .persist_if_unchanged(&previous, next)
            .inspect_err(|e| {
                warn!(session_id = %id, operation, error = %e, "persist failed");
            })?;

        info!(
            session_id = %id,
            operation,
            status = %saved.status,
            revision = saved.revision,
            "session updated"
        );
        Ok((saved, output))
    }
}
