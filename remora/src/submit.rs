use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tracing::{info, Instrument};

use crate::job::{JobKey, JobRecord, OwnerId};
use crate::payload::{JobMessage, JobPayload};
use crate::queue::WorkQueue;
use crate::store::JobStore;
use crate::telemetry;

/// Accepts typed job requests, persists the initial record, and
/// publishes the message a worker will later consume.
///
/// Dependencies are injected, not ambient; construct one per process
/// with the store and queue it should use. The record is written before
/// the message is published, so a worker can always resolve a delivered
/// key back to a record. There is no internal retry: the caller observes
/// failure synchronously and may resubmit, which creates a new distinct
/// job.
pub struct JobSubmitter<S, Q> {
    store: Arc<S>,
    queue: Arc<Q>,
    // Last issued sort-key timestamp. Submission timestamps are forced
    // strictly increasing per process so rapid submissions from one
    // owner never collide on the composite key.
    last_issued_ms: AtomicI64,
}

impl<S, Q> JobSubmitter<S, Q>
where
    S: JobStore,
    Q: WorkQueue,
{
    pub fn new(store: Arc<S>, queue: Arc<Q>) -> Self {
        Self {
            store,
            queue,
            last_issued_ms: AtomicI64::new(0),
        }
    }

    /// Submit one unit of work. Returns the key under which its record
    /// was persisted.
    ///
    /// On store failure nothing was published. On publish failure the
    /// record exists but no message does; the job stays `pending` until
    /// an operator remediates it (see [`crate::sweep`]).
    pub async fn submit(&self, owner: OwnerId, payload: JobPayload) -> anyhow::Result<JobKey> {
        let kind = payload.kind();
        let span = telemetry::submit_span(owner.as_str(), kind);

        async {
            let submitted_at_ms = self.next_timestamp();
            let key = JobKey::new(owner, submitted_at_ms);

            let record = JobRecord::pending(key.clone(), kind);
            self.store
                .create(record)
                .await
                .context("job record write failed; nothing was enqueued")?;

            let message = JobMessage::new(key.clone(), payload);
            self.queue.publish(&message).await.with_context(|| {
                format!("job {key} persisted but message publish failed; record stays pending")
            })?;

            telemetry::record_job_submitted(kind);
            info!(job = %key, kind = %kind, "job submitted");
            Ok(key)
        }
        .instrument(span)
        .await
    }

    fn next_timestamp(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut issued = now;
        let _ = self
            .last_issued_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                issued = now.max(last + 1);
                Some(issued)
            });
        issued
    }
}
