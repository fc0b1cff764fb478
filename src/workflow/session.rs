use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::navigator::SequenceNavigator;
use super::progress::{ProgressEstimator, ProgressSnapshot};
use super::status::{FinishOutcome, SessionStatus, StateMachine, VisitStatus};
use crate::error::{Result, WorkflowError};

/// Which session statuses permit `rename`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenamePolicy {
    /// Same mutation surface as `reorder`.
    #[default]
    DraftOnly,
    /// Drafts and sessions in progress.
    UntilFinished,
}

impl RenamePolicy {
    fn allows(self, status: SessionStatus) -> bool {
        match self {
            RenamePolicy::DraftOnly => status == SessionStatus::Draft,
            RenamePolicy::UntilFinished => !status.is_terminal(),
        }
    }
}

/// Planned and actual work for one hive within a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitEntry {
    pub id: Uuid,
    pub site_id: String,
    pub order: i64,
    pub status: VisitStatus,
    pub record_id: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub skip_count: u32,
}

impl VisitEntry {
    pub fn new(site_id: String, order: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            site_id,
            order,
            status: VisitStatus::Pending,
            record_id: None,
            completed_at: None,
            skip_count: 0,
        }
    }
}

/// One round of planned hive visits within an apiary.
///
/// Every mutating operation validates first and only then writes, so a
/// returned error always leaves the session exactly as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSession {
    pub id: Uuid,
    pub name: String,
    pub site_group_id: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub visits: Vec<VisitEntry>,
    /// Storage revision, maintained by the session store.
    #[serde(default)]
    pub revision: u64,
}

fn clean_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(WorkflowError::InvalidArgument(
            "session name must not be empty".into(),
        ));
    }
    Ok(trimmed.to_string())
}

impl BatchSession {
    /// Create a draft with one pending visit per site, ordered as given.
    pub fn create<S: AsRef<str>>(
        site_group_id: &str,
        name: &str,
        site_ids: &[S],
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let sites: Vec<(String, i64)> = site_ids
            .iter()
            .enumerate()
            .map(|(i, s)| (s.as_ref().to_string(), i as i64))
            .collect();
        Self::create_with_order(site_group_id, name, &sites, now)
    }

    /// Create a draft with explicit `order` values per site.
    pub fn create_with_order(
        site_group_id: &str,
        name: &str,
        sites: &[(String, i64)],
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let name = clean_name(name)?;
        if site_group_id.trim().is_empty() {
            return Err(WorkflowError::InvalidArgument(
                "site group id must not be empty".into(),
            ));
        }
        if sites.is_empty() {
            return Err(WorkflowError::InvalidArgument(
                "a session needs at least one site".into(),
            ));
        }

        let mut seen_sites = HashSet::with_capacity(sites.len());
        let mut seen_orders = HashSet::with_capacity(sites.len());
        for (site_id, order) in sites {
            if site_id.trim().is_empty() {
                return Err(WorkflowError::InvalidArgument(
                    "site id must not be empty".into(),
                ));
            }
            if !seen_sites.insert(site_id.as_str()) {
                return Err(WorkflowError::InvalidArgument(format!(
                    "site {site_id} appears more than once"
                )));
            }
            if !seen_orders.insert(*order) {
                return Err(WorkflowError::InvalidArgument(format!(
                    "order value {order} is used more than once"
                )));
            }
        }

        let mut visits: Vec<VisitEntry> = sites
            .iter()
            .map(|(site_id, order)| VisitEntry::new(site_id.clone(), *order))
            .collect();
        visits.sort_by_key(|v| v.order);

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            site_group_id: site_group_id.to_string(),
            status: SessionStatus::Draft,
            created_at: now,
            started_at: None,
            completed_at: None,
            visits,
            revision: 0,
        })
    }

    pub fn navigator(&self) -> SequenceNavigator<'_> {
        SequenceNavigator::new(&self.visits)
    }

    pub fn entry(&self, entry_id: Uuid) -> Result<&VisitEntry> {
        self.visits
            .iter()
            .find(|v| v.id == entry_id)
            .ok_or_else(|| WorkflowError::entry_not_found(entry_id))
    }

    pub fn entry_for_site(&self, site_id: &str) -> Option<&VisitEntry> {
        self.visits.iter().find(|v| v.site_id == site_id)
    }

    pub fn current_visit(&self) -> Option<&VisitEntry> {
        self.navigator().current()
    }

    pub fn position_of(&self, entry_id: Uuid) -> Result<usize> {
        self.navigator().position_of(entry_id)
    }

    pub fn has_next(&self, entry_id: Uuid) -> Result<bool> {
        self.navigator().has_next(entry_id)
    }

    pub fn has_previous(&self, entry_id: Uuid) -> Result<bool> {
        self.navigator().has_previous(entry_id)
    }

    pub fn progress(&self, now: DateTime<Utc>) -> ProgressSnapshot {
        ProgressEstimator::estimate(self, now)
    }

    pub fn rename(&mut self, new_name: &str, policy: RenamePolicy) -> Result<()> {
        if !policy.allows(self.status) {
            return Err(WorkflowError::invalid_state("rename", self.status));
        }
        self.name = clean_name(new_name)?;
        Ok(())
    }

    pub fn reorder(&mut self, new_order: &[(Uuid, i64)]) -> Result<()> {
        SequenceNavigator::reorder(self.status, &mut self.visits, new_order)
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.status = StateMachine::session("start", self.status, SessionStatus::InProgress)?;
        self.started_at = Some(now);
        Ok(())
    }

    fn require_in_progress(&self, operation: &'static str) -> Result<()> {
        if self.status != SessionStatus::InProgress {
            return Err(WorkflowError::invalid_state(operation, self.status));
        }
        Ok(())
    }

    fn current_index(&self) -> Result<usize> {
        let current = self.current_visit().ok_or(WorkflowError::NoPendingVisit)?;
        let id = current.id;
        self.visits
            .iter()
            .position(|v| v.id == id)
            .ok_or(WorkflowError::NoPendingVisit)
    }

    /// Mark the current visit completed with the inspection record the
    /// caller produced for it. Returns the completed entry's id.
    pub fn complete_current_visit(
        &mut self,
        record_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Uuid> {
        self.require_in_progress("complete a visit in")?;
        if record_id.trim().is_empty() {
            return Err(WorkflowError::InvalidArgument(
                "record id must not be empty".into(),
            ));
        }
        let idx = self.current_index()?;

        let entry = &mut self.visits[idx];
        entry.status = StateMachine::visit(entry.status, VisitStatus::Completed)?;
        entry.record_id = Some(record_id.to_string());
        entry.completed_at = Some(now);
        Ok(entry.id)
    }

    pub fn cancel_visit(&mut self, entry_id: Uuid) -> Result<()> {
        self.require_in_progress("cancel a visit in")?;
        let entry = self
            .visits
            .iter_mut()
            .find(|v| v.id == entry_id)
            .ok_or_else(|| WorkflowError::entry_not_found(entry_id))?;

        entry.status = StateMachine::visit(entry.status, VisitStatus::Cancelled)?;
        Ok(())
    }

    /// Defer the current visit. Only the skip counter moves: the entry keeps
    /// its status and order, so it stays current until completed, cancelled
    /// or reordered.
    pub fn skip_current_visit(&mut self) -> Result<Uuid> {
        self.require_in_progress("skip a visit in")?;
        let idx = self.current_index()?;

        let entry = &mut self.visits[idx];
        entry.skip_count = entry.skip_count.saturating_add(1);
        Ok(entry.id)
    }

    /// End the session. Pending visits are left as they are.
    pub fn finish(&mut self, outcome: FinishOutcome, now: DateTime<Utc>) -> Result<()> {
        self.status = StateMachine::session("finish", self.status, outcome.into())?;
        self.completed_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn abc() -> BatchSession {
        BatchSession::create("apiary-1", "Spring Round", &["A", "B", "C"], Utc::now()).unwrap()
    }

    fn started() -> BatchSession {
        let mut s = abc();
        s.start(Utc::now()).unwrap();
        s
    }

    #[test]
    fn create_builds_pending_entries_in_input_order() {
        let sites: Vec<String> = (0..6).map(|i| format!("hive-{i}")).collect();
        let s = BatchSession::create("apiary-1", "Round", &sites, Utc::now()).unwrap();

        assert_eq!(s.status, SessionStatus::Draft);
        assert_eq!(s.visits.len(), 6);
        assert!(s.started_at.is_none());
        assert!(s.completed_at.is_none());
        for (i, v) in s.visits.iter().enumerate() {
            assert_eq!(v.status, VisitStatus::Pending);
            assert_eq!(v.order, i as i64);
            assert_eq!(v.site_id, sites[i]);
            assert_eq!(v.skip_count, 0);
            assert!(v.record_id.is_none());
        }
    }

    #[test]
    fn create_rejects_empty_site_list() {
        let none: [&str; 0] = [];
        let err = BatchSession::create("apiary-1", "Spring Round", &none, Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidArgument(_)));
    }

    #[test]
    fn create_rejects_duplicate_sites() {
        let err =
            BatchSession::create("apiary-1", "Round", &["A", "B", "A"], Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidArgument(_)));
    }

    #[test]
    fn create_rejects_blank_name() {
        let err = BatchSession::create("apiary-1", "   ", &["A"], Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidArgument(_)));
    }

    #[test]
    fn create_with_explicit_order() {
        let sites = vec![("A".to_string(), 30), ("B".to_string(), 10), ("C".to_string(), 20)];
        let s = BatchSession::create_with_order("apiary-1", "Round", &sites, Utc::now()).unwrap();
        assert_eq!(s.current_visit().unwrap().site_id, "B");
        let a = s.entry_for_site("A").unwrap().id;
        assert_eq!(s.position_of(a).unwrap(), 3);

        let dup = vec![("A".to_string(), 1), ("B".to_string(), 1)];
        let err =
            BatchSession::create_with_order("apiary-1", "Round", &dup, Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidArgument(_)));
    }

    #[test]
    fn start_twice_is_invalid_state_and_keeps_started_at() {
        let mut s = abc();
        let first = Utc::now();
        s.start(first).unwrap();
        assert_eq!(s.status, SessionStatus::InProgress);
        assert_eq!(s.started_at, Some(first));

        let err = s.start(first + Duration::minutes(1)).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
        assert_eq!(s.started_at, Some(first));
    }

    #[test]
    fn complete_current_visit_changes_only_that_entry() {
        let mut s = started();
        let before = s.clone();
        let now = Utc::now();

        let id = s.complete_current_visit("r1", now).unwrap();
        assert_eq!(id, before.visits[0].id);

        let done = s.entry(id).unwrap();
        assert_eq!(done.status, VisitStatus::Completed);
        assert_eq!(done.record_id.as_deref(), Some("r1"));
        assert_eq!(done.completed_at, Some(now));
        assert_eq!(s.visits[1..], before.visits[1..]);
        assert_eq!(s.status, before.status);
        assert_eq!(s.started_at, before.started_at);
    }

    #[test]
    fn complete_on_draft_is_invalid_state() {
        let mut s = abc();
        let before = s.clone();
        let err = s.complete_current_visit("r1", Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
        assert_eq!(s, before);
    }

    #[test]
    fn complete_without_pending_visit() {
        let mut s = started();
        for r in ["r1", "r2", "r3"] {
            s.complete_current_visit(r, Utc::now()).unwrap();
        }
        let err = s.complete_current_visit("r4", Utc::now()).unwrap_err();
        assert!(matches!(err, WorkflowError::NoPendingVisit));
        let err = s.skip_current_visit().unwrap_err();
        assert!(matches!(err, WorkflowError::NoPendingVisit));
    }

    #[test]
    fn cancel_visit_rules() {
        let mut draft = abc();
        let c = draft.visits[2].id;
        assert!(matches!(
            draft.cancel_visit(c).unwrap_err(),
            WorkflowError::InvalidState { .. }
        ));

        let mut s = started();
        let c = s.visits[2].id;
        s.cancel_visit(c).unwrap();
        assert_eq!(s.entry(c).unwrap().status, VisitStatus::Cancelled);
        assert!(s.entry(c).unwrap().record_id.is_none());

        assert!(matches!(
            s.cancel_visit(c).unwrap_err(),
            WorkflowError::InvalidTransition { .. }
        ));
        assert!(matches!(
            s.cancel_visit(Uuid::new_v4()).unwrap_err(),
            WorkflowError::NotFound(_)
        ));
    }

    #[test]
    fn skip_only_bumps_the_counter() {
        let mut s = started();
        let a = s.visits[0].id;

        let skipped = s.skip_current_visit().unwrap();
        assert_eq!(skipped, a);

        let entry = s.entry(a).unwrap();
        assert_eq!(entry.skip_count, 1);
        assert_eq!(entry.status, VisitStatus::Pending);
        assert_eq!(entry.order, 0);
        assert_eq!(s.current_visit().unwrap().id, a);
    }

    #[test]
    fn reorder_only_in_draft() {
        let mut s = abc();
        let ids: Vec<Uuid> = s.visits.iter().map(|v| v.id).collect();
        s.reorder(&[(ids[0], 2), (ids[1], 1), (ids[2], 0)]).unwrap();
        assert_eq!(s.current_visit().unwrap().site_id, "C");

        s.start(Utc::now()).unwrap();
        let err = s.reorder(&[(ids[0], 0), (ids[1], 1), (ids[2], 2)]).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
    }

    #[test]
    fn reorder_with_bad_mapping_after_start_is_invalid_state() {
        let mut s = started();
        let ids: Vec<Uuid> = s.visits.iter().map(|v| v.id).collect();

        let err = s.reorder(&[]).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));

        let err = s.reorder(&[(ids[0], 1), (ids[1], 1)]).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
        assert_eq!(s.current_visit().unwrap().site_id, "A");
    }

    #[test]
    fn skip_on_draft_is_invalid_state() {
        let mut s = abc();
        let err = s.skip_current_visit().unwrap_err();
        assert!(matches!(
            err,
            WorkflowError::InvalidState {
                status: SessionStatus::Draft,
                ..
            }
        ));
        assert!(s.visits.iter().all(|v| v.skip_count == 0));
    }

    #[test]
    fn skip_counter_saturates() {
        let mut s = started();
        s.visits[0].skip_count = u32::MAX;
        let skipped = s.skip_current_visit().unwrap();
        assert_eq!(s.entry(skipped).unwrap().skip_count, u32::MAX);
    }

    #[test]
    fn rename_follows_policy() {
        let mut s = abc();
        s.rename("  Autumn Round ", RenamePolicy::DraftOnly).unwrap();
        assert_eq!(s.name, "Autumn Round");

        s.start(Utc::now()).unwrap();
        let err = s.rename("Late Round", RenamePolicy::DraftOnly).unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidState { .. }));
        assert_eq!(s.name, "Autumn Round");

        s.rename("Late Round", RenamePolicy::UntilFinished).unwrap();
        assert_eq!(s.name, "Late Round");

        s.finish(FinishOutcome::Cancelled, Utc::now()).unwrap();
        assert!(s.rename("Too Late", RenamePolicy::UntilFinished).is_err());
    }

    #[test]
    fn finish_rules() {
        let mut draft = abc();
        assert!(matches!(
            draft.finish(FinishOutcome::Completed, Utc::now()).unwrap_err(),
            WorkflowError::InvalidState { .. }
        ));
        assert!(draft.completed_at.is_none());

        let mut s = started();
        let end = Utc::now();
        s.finish(FinishOutcome::Cancelled, end).unwrap();
        assert_eq!(s.status, SessionStatus::Cancelled);
        assert_eq!(s.completed_at, Some(end));

        let err = s
            .finish(FinishOutcome::Completed, end + Duration::minutes(1))
            .unwrap_err();
        assert!(matches!(err, WorkflowError::InvalidTransition { .. }));
        assert_eq!(s.completed_at, Some(end));
    }

    #[test]
    fn operations_after_finish_are_rejected() {
        let mut s = started();
        s.finish(FinishOutcome::Completed, Utc::now()).unwrap();
        let b = s.visits[1].id;

        assert!(matches!(
            s.complete_current_visit("r1", Utc::now()).unwrap_err(),
            WorkflowError::InvalidState { .. }
        ));
        assert!(matches!(
            s.cancel_visit(b).unwrap_err(),
            WorkflowError::InvalidState { .. }
        ));
        assert!(matches!(
            s.skip_current_visit().unwrap_err(),
            WorkflowError::InvalidState { .. }
        ));
        assert!(matches!(
            s.start(Utc::now()).unwrap_err(),
            WorkflowError::InvalidTransition { .. }
        ));
    }

    #[test]
    fn three_hive_round() {
        let mut s = abc();
        let (a, b, c) = (s.visits[0].id, s.visits[1].id, s.visits[2].id);
        let start = Utc::now();
        s.start(start).unwrap();

        s.complete_current_visit("r1", start + Duration::minutes(12)).unwrap();
        assert_eq!(s.entry(a).unwrap().status, VisitStatus::Completed);
        assert_eq!(s.current_visit().unwrap().id, b);

        s.cancel_visit(c).unwrap();
        let p = s.progress(start + Duration::minutes(15));
        assert_eq!((p.total, p.completed, p.cancelled, p.pending), (3, 1, 1, 1));

        let end = start + Duration::minutes(20);
        s.finish(FinishOutcome::Completed, end).unwrap();
        assert_eq!(s.status, SessionStatus::Completed);
        assert_eq!(s.completed_at, Some(end));
        assert_eq!(s.entry(b).unwrap().status, VisitStatus::Pending);
    }

    #[test]
    fn session_serialization_roundtrip() {
        let s = started();
        let json = serde_json::to_string(&s).unwrap();
        let back: BatchSession = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
