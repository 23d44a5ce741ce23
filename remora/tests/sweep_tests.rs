//! Reconciliation sweep tests over the in-memory store fake.

use std::sync::Arc;

use chrono::{Duration, Utc};

use remora_testkit::store::InMemoryJobStore;

use remora::config::SweepConfig;
use remora::job::{JobKey, JobKind, JobRecord, JobStatus, OwnerId};
use remora::store::JobStore as _;
use remora::sweep::ReconciliationSweep;

fn record_at(owner: &str, ms: i64, kind: JobKind) -> JobRecord {
    JobRecord::pending(
        JobKey::new(OwnerId::new(owner).unwrap(), ms),
        kind,
    )
}

#[tokio::test]
async fn sweep_reports_old_pending_and_running_only() {
    let store = Arc::new(InMemoryJobStore::new());
    let now = Utc::now();
    let old_ms = (now - Duration::seconds(3600)).timestamp_millis();
    let fresh_ms = now.timestamp_millis();

    // Old pending job: stuck.
    let stuck_pending = record_at("user-1", old_ms, JobKind::Example);
    store.create(stuck_pending.clone()).await.unwrap();

    // Old running job: stuck.
    let stuck_running = record_at("user-1", old_ms + 1, JobKind::Translate);
    store.create(stuck_running.clone()).await.unwrap();
    store
        .transition(&stuck_running.key, JobStatus::Running, None)
        .await
        .unwrap();
    store.backdate(&stuck_running.key, now - Duration::seconds(3600));

    // Fresh pending job: not stuck.
    store
        .create(record_at("user-2", fresh_ms, JobKind::Example))
        .await
        .unwrap();

    // Old completed job: terminal, never reported.
    let done = record_at("user-3", old_ms + 2, JobKind::Example);
    store.create(done.clone()).await.unwrap();
    store
        .transition(&done.key, JobStatus::Running, None)
        .await
        .unwrap();
    store
        .transition(&done.key, JobStatus::Completed, None)
        .await
        .unwrap();
    store.backdate(&done.key, now - Duration::seconds(3600));

    let sweep = ReconciliationSweep::new(store, SweepConfig::default());
    let report = sweep.run_once(now).await.unwrap();

    assert_eq!(report.stuck_pending.len(), 1);
    assert_eq!(report.stuck_pending[0].key, stuck_pending.key);
    assert_eq!(report.stuck_running.len(), 1);
    assert_eq!(report.stuck_running[0].key, stuck_running.key);
}

#[tokio::test]
async fn empty_store_sweeps_clean() {
    let store = Arc::new(InMemoryJobStore::new());
    let sweep = ReconciliationSweep::new(store, SweepConfig::default());
    let report = sweep.run_once(Utc::now()).await.unwrap();
    assert!(report.is_empty());
}
