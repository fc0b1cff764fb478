use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::session::VisitEntry;
use super::status::{SessionStatus, VisitStatus};
use crate::error::{Result, WorkflowError};

/// A read-only view over a session's visits, sorted by `order` ascending.
///
/// Navigation is positional: `next_of`/`previous_of` step over entries
/// regardless of status so an operator can review finished work.
pub struct SequenceNavigator<'a> {
    ordered: Vec<&'a VisitEntry>,
}

impl<'a> SequenceNavigator<'a> {
    pub fn new(visits: &'a [VisitEntry]) -> Self {
        let mut ordered: Vec<&VisitEntry> = visits.iter().collect();
        ordered.sort_by_key(|v| v.order);
        Self { ordered }
    }

    pub fn ordered(&self) -> &[&'a VisitEntry] {
        &self.ordered
    }

    /// The first pending entry in order, i.e. the operator's next task.
    pub fn current(&self) -> Option<&'a VisitEntry> {
        self.ordered
            .iter()
            .copied()
            .find(|v| v.status == VisitStatus::Pending)
    }

    fn index_of(&self, entry_id: Uuid) -> Result<usize> {
        self.ordered
            .iter()
            .position(|v| v.id == entry_id)
            .ok_or_else(|| WorkflowError::entry_not_found(entry_id))
    }

    /// 1-based position of the entry within the full sequence.
    pub fn position_of(&self, entry_id: Uuid) -> Result<usize> {
        self.index_of(entry_id).map(|i| i + 1)
    }

    pub fn has_next(&self, entry_id: Uuid) -> Result<bool> {
        Ok(self.next_of(entry_id)?.is_some())
    }

    pub fn has_previous(&self, entry_id: Uuid) -> Result<bool> {
        Ok(self.previous_of(entry_id)?.is_some())
    }

    pub fn next_of(&self, entry_id: Uuid) -> Result<Option<&'a VisitEntry>> {
        let idx = self.index_of(entry_id)?;
        Ok(self.ordered.get(idx + 1).copied())
    }

    pub fn previous_of(&self, entry_id: Uuid) -> Result<Option<&'a VisitEntry>> {
        let idx = self.index_of(entry_id)?;
        Ok(idx.checked_sub(1).and_then(|i| self.ordered.get(i).copied()))
    }

    /// Apply a full permutation of `order` values to `visits`.
    ///
    /// Only drafts may be reordered: once work has started the recorded
    /// order is part of the session's history. The mapping must name every
    /// existing entry exactly once and assign unique order values. On error
    /// `visits` is left untouched.
    pub fn reorder(
        status: SessionStatus,
        visits: &mut [VisitEntry],
        new_order: &[(Uuid, i64)],
    ) -> Result<()> {
        if status != SessionStatus::Draft {
            return Err(WorkflowError::invalid_state("reorder", status));
        }

        if new_order.len() != visits.len() {
            return Err(WorkflowError::InvalidArgument(format!(
                "reorder must cover all {} visits, got {}",
                visits.len(),
                new_order.len()
            )));
        }

        let known: HashSet<Uuid> = visits.iter().map(|v| v.id).collect();
        let mut mapping: HashMap<Uuid, i64> = HashMap::with_capacity(new_order.len());
        let mut orders: HashSet<i64> = HashSet::with_capacity(new_order.len());

        for &(entry_id, order) in new_order {
            if !known.contains(&entry_id) {
                return Err(WorkflowError::InvalidArgument(format!(
                    "visit entry {entry_id} does not belong to this session"
                )));
            }
            if mapping.insert(entry_id, order).is_some() {
                return Err(WorkflowError::InvalidArgument(format!(
                    "visit entry {entry_id} appears more than once"
                )));
            }
            if !orders.insert(order) {
                return Err(WorkflowError::InvalidArgument(format!(
                    "order value {order} is used more than once"
                )));
            }
        }

        for visit in visits.iter_mut() {
            if let Some(&order) = mapping.get(&visit.id) {
                visit.order = order;
            }
        }
        visits.sort_by_key(|v| v.order);
        Ok(())
    }
}
