use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::warn;

use crate::config::SweepConfig;
use crate::job::{JobRecord, JobStatus};
use crate::store::JobStore;

/// Point-in-time report of jobs stuck short of a terminal status.
///
/// `pending` past its threshold usually means the submit-side publish
/// was lost; `running` past its threshold usually means the
/// finalization write was lost after handler side effects.
#[derive(Clone, Debug, Default)]
pub struct SweepReport {
    pub sampled_at: DateTime<Utc>,
    pub stuck_pending: Vec<JobRecord>,
    pub stuck_running: Vec<JobRecord>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.stuck_pending.is_empty() && self.stuck_running.is_empty()
    }
}

/// Periodic scan for jobs stuck in `pending` or `running` past their
/// configured thresholds.
///
/// The sweep observes and reports; it never mutates records. Automatic
/// repair of the finalization-failure hole is a deliberate non-feature:
/// the handler's side effects may or may not have happened, so the call
/// is an operator's to make, via [`crate::JobWorker::reinvoke`] or
/// manual correction.
pub struct ReconciliationSweep<S> {
    store: Arc<S>,
    config: SweepConfig,
}

impl<S> ReconciliationSweep<S>
where
    S: JobStore,
{
    pub fn new(store: Arc<S>, config: SweepConfig) -> Self {
        Self { store, config }
    }

    /// Run one scan as of `now` and report stuck records.
    pub async fn run_once(&self, now: DateTime<Utc>) -> anyhow::Result<SweepReport> {
        let pending_cutoff = now - Duration::seconds(self.config.pending_age_secs as i64);
        let running_cutoff = now - Duration::seconds(self.config.running_age_secs as i64);
        // One scan with the looser cutoff, then split per status.
        let scan_cutoff = pending_cutoff.max(running_cutoff);

        let mut report = SweepReport {
            sampled_at: now,
            ..Default::default()
        };

        for record in self.store.scan_stuck(scan_cutoff).await? {
            match record.status {
                JobStatus::Pending if record.updated_at <= pending_cutoff => {
                    report.stuck_pending.push(record);
                }
                JobStatus::Running if record.updated_at <= running_cutoff => {
                    report.stuck_running.push(record);
                }
                _ => {}
            }
        }

        if !report.is_empty() {
            warn!(
                stuck_pending = report.stuck_pending.len(),
                stuck_running = report.stuck_running.len(),
                "reconciliation sweep found stuck jobs"
            );
        }

        Ok(report)
    }
}
