//! End-to-end walkthrough with the in-memory fakes.
//!
//! Submits an example job, a translate job, and a translate job whose
//! target item does not exist, then plays the transport: receive a
//! batch, run the worker, settle, repeat until the queue drains.
//! Finishes with a reconciliation sweep over the store.

use std::sync::Arc;

use remora::store::JobStore as _;
use remora::{
    JobHandlers, JobPayload, JobSubmitter, JobWorker, OwnerId, ReconciliationSweep, SweepConfig,
    WorkerConfig,
};
use remora_testkit::{
    CapturingEventSink, FakeTranslator, InMemoryJobStore, InMemoryTodoStore, InMemoryWorkQueue,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let store = Arc::new(InMemoryJobStore::new());
    let queue = Arc::new(InMemoryWorkQueue::new());
    let todos = Arc::new(InMemoryTodoStore::new());
    let translator = Arc::new(FakeTranslator::new());
    let events = Arc::new(CapturingEventSink::new());

    let config = WorkerConfig {
        invocation_permits: 1,
        example_job_delay_ms: 500,
    };
    let handlers = JobHandlers::new(
        Arc::clone(&todos) as _,
        Arc::clone(&translator) as _,
        Arc::clone(&events) as _,
        &config,
    );
    let worker = JobWorker::new(Arc::clone(&store), handlers, &config);
    let submitter = JobSubmitter::new(Arc::clone(&store), Arc::clone(&queue));

    let owner = OwnerId::new("user-1")?;
    let todo = todos.insert("Buy milk", owner.as_str(), "active");

    submitter.submit(owner.clone(), JobPayload::Example {}).await?;
    submitter
        .submit(
            owner.clone(),
            JobPayload::Translate {
                todo_item_id: todo.id,
                owner_id: owner.as_str().into(),
            },
        )
        .await?;
    submitter
        .submit(
            owner.clone(),
            JobPayload::Translate {
                todo_item_id: "missing".into(),
                owner_id: owner.as_str().into(),
            },
        )
        .await?;

    // Play the transport until the queue drains.
    while queue.ready_len() > 0 {
        let batch = queue.receive_batch(10);
        println!("delivering batch of {}", batch.len());
        let disposition = worker.process_batch(batch).await;
        println!("invocation settled, {} failed", disposition.failure_count());
        queue.settle(&disposition);
    }

    for record in store.list_owner(&owner).await? {
        println!(
            "{} kind={} status={} reason={:?}",
            record.key, record.kind, record.status, record.reason
        );
    }
    for item in todos.items() {
        println!("todo {}: {} - {}", item.id, item.title, item.description);
    }
    for event in events.events() {
        println!("event on {}: {}", event.channel, event.payload);
    }

    let sweep = ReconciliationSweep::new(Arc::clone(&store), SweepConfig::default());
    let report = sweep.run_once(chrono::Utc::now()).await?;
    println!(
        "sweep: {} stuck pending, {} stuck running",
        report.stuck_pending.len(),
        report.stuck_running.len()
    );

    Ok(())
}
