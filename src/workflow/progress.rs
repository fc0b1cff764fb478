use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::session::BatchSession;
use super::status::VisitStatus;

/// Derived, never stored: counts and an ETA for the remaining work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub total: usize,
    pub completed: usize,
    pub cancelled: usize,
    pub pending: usize,
    pub elapsed_minutes: Option<f64>,
    pub average_minutes_per_hive: Option<f64>,
    pub estimated_remaining_minutes: Option<f64>,
}

pub struct ProgressEstimator;

impl ProgressEstimator {
    /// Compute a snapshot of `session` as seen at `now`.
    ///
    /// The rate only counts completed visits; cancelled ones took no
    /// inspection time and need no further work, so they feed neither the
    /// average nor `pending`. No smoothing is applied.
    pub fn estimate(session: &BatchSession, now: DateTime<Utc>) -> ProgressSnapshot {
        let total = session.visits.len();
        let completed = session
            .visits
            .iter()
            .filter(|v| v.status == VisitStatus::Completed)
            .count();
        let cancelled = session
            .visits
            .iter()
            .filter(|v| v.status == VisitStatus::Cancelled)
            .count();
        let pending = total - completed - cancelled;

        // Clamped so a clock that stepped backwards never yields negative time.
        let elapsed_minutes = session.started_at.map(|started| {
            let millis = (now - started).num_milliseconds().max(0);
            millis as f64 / 60_000.0
        });

        let average_minutes_per_hive = match elapsed_minutes {
            Some(elapsed) if completed > 0 => Some(elapsed / completed as f64),
            _ => None,
        };

        let estimated_remaining_minutes = average_minutes_per_hive.map(|avg| avg * pending as f64);

        ProgressSnapshot {
            total,
            completed,
            cancelled,
            pending,
            elapsed_minutes,
            average_minutes_per_hive,
            estimated_remaining_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::workflow::SessionStatus;

    fn session(n: usize) -> BatchSession {
        let sites: Vec<String> = (0..n).map(|i| format!("hive-{i}")).collect();
        BatchSession::create("apiary-1", "Round", &sites, Utc::now()).unwrap()
    }

    #[test]
    fn draft_has_no_timing() {
        let s = session(3);
        let p = ProgressEstimator::estimate(&s, Utc::now());
        assert_eq!(p.total, 3);
        assert_eq!(p.pending, 3);
        assert_eq!(p.elapsed_minutes, None);
        assert_eq!(p.average_minutes_per_hive, None);
        assert_eq!(p.estimated_remaining_minutes, None);
    }

    #[test]
    fn freshly_started_has_elapsed_but_no_eta() {
        let mut s = session(2);
        let start = Utc::now();
        s.start(start).unwrap();

        let p = ProgressEstimator::estimate(&s, start + Duration::minutes(5));
        assert_eq!(p.elapsed_minutes, Some(5.0));
        assert_eq!(p.average_minutes_per_hive, None);
        assert_eq!(p.estimated_remaining_minutes, None);
    }

    #[test]
    fn eta_uses_completed_rate_and_ignores_cancelled() {
        let mut s = session(5);
        let start = Utc::now();
        s.start(start).unwrap();

        s.complete_current_visit("r1", start + Duration::minutes(10)).unwrap();
        s.complete_current_visit("r2", start + Duration::minutes(20)).unwrap();
        let last = s.visits[4].id;
        s.cancel_visit(last).unwrap();

        let p = ProgressEstimator::estimate(&s, start + Duration::minutes(30));
        assert_eq!(p.completed, 2);
        assert_eq!(p.cancelled, 1);
        assert_eq!(p.pending, 2);
        assert_eq!(p.elapsed_minutes, Some(30.0));
        assert_eq!(p.average_minutes_per_hive, Some(15.0));
        assert_eq!(p.estimated_remaining_minutes, Some(30.0));
    }

    #[test]
    fn average_uses_real_division() {
        let mut s = session(4);
        let start = Utc::now();
        s.start(start).unwrap();
        for r in ["r1", "r2", "r3"] {
            s.complete_current_visit(r, start).unwrap();
        }

        let p = ProgressEstimator::estimate(&s, start + Duration::minutes(10));
        let avg = p.average_minutes_per_hive.unwrap();
        assert!((avg - 10.0 / 3.0).abs() < 1e-9);
        assert!((p.estimated_remaining_minutes.unwrap() - 10.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn clock_skew_clamps_to_zero() {
        let mut s = session(1);
        let start = Utc::now();
        s.start(start).unwrap();
        let p = ProgressEstimator::estimate(&s, start - Duration::minutes(3));
        assert_eq!(p.elapsed_minutes, Some(0.0));
    }

    #[test]
    fn finished_session_with_residual_pending() {
        let mut s = session(2);
        let start = Utc::now();
        s.start(start).unwrap();
        s.complete_current_visit("r1", start + Duration::minutes(8)).unwrap();
        s.finish(crate::workflow::FinishOutcome::Completed, start + Duration::minutes(9))
            .unwrap();
        assert_eq!(s.status, SessionStatus::Completed);

        let p = ProgressEstimator::estimate(&s, start + Duration::minutes(8));
        assert_eq!(p.pending, 1);
        assert_eq!(p.estimated_remaining_minutes, Some(8.0));
    }
}
