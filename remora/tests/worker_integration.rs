//! End-to-end tests over the in-memory store and queue fakes: submit,
//! deliver, dispatch, settle, redeliver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use remora::{
    Delivery, JobHandlers, JobKey, JobMessage, JobPayload, JobRecord, JobStatus, JobSubmitter,
    JobWorker, OwnerId, WorkerConfig,
};
use remora_testkit::{
    CapturingEventSink, FakeTranslator, InMemoryJobStore, InMemoryTodoStore, InMemoryWorkQueue,
};

struct Harness {
    store: Arc<InMemoryJobStore>,
    queue: Arc<InMemoryWorkQueue>,
    todos: Arc<InMemoryTodoStore>,
    translator: Arc<FakeTranslator>,
    events: Arc<CapturingEventSink>,
    submitter: JobSubmitter<InMemoryJobStore, InMemoryWorkQueue>,
    worker: Arc<JobWorker<InMemoryJobStore>>,
}

fn harness() -> Harness {
    harness_with(WorkerConfig {
        invocation_permits: 1,
        example_job_delay_ms: 10,
    })
}

fn harness_with(config: WorkerConfig) -> Harness {
    let store = Arc::new(InMemoryJobStore::new());
    let queue = Arc::new(InMemoryWorkQueue::new());
    let todos = Arc::new(InMemoryTodoStore::new());
    let translator = Arc::new(FakeTranslator::new());
    let events = Arc::new(CapturingEventSink::new());

    let handlers = JobHandlers::new(
        Arc::clone(&todos) as _,
        Arc::clone(&translator) as _,
        Arc::clone(&events) as _,
        &config,
    );

    Harness {
        submitter: JobSubmitter::new(Arc::clone(&store), Arc::clone(&queue)),
        worker: Arc::new(JobWorker::new(Arc::clone(&store), handlers, &config)),
        store,
        queue,
        todos,
        translator,
        events,
    }
}

fn owner(id: &str) -> OwnerId {
    OwnerId::new(id).unwrap()
}

async fn status_of(h: &Harness, key: &JobKey) -> JobRecord {
    use remora::store::JobStore as _;
    h.store.get(key).await.unwrap().expect("record exists")
}

#[tokio::test]
async fn example_job_runs_pending_running_completed() {
    let h = harness();
    let key = h
        .submitter
        .submit(owner("user-1"), JobPayload::Example {})
        .await
        .unwrap();

    assert_eq!(status_of(&h, &key).await.status, JobStatus::Pending);

    let batch = h.queue.receive_batch(10);
    assert_eq!(batch.len(), 1);
    let disposition = h.worker.process_batch(batch).await;
    assert!(disposition.is_clean());
    h.queue.settle(&disposition);

    let record = status_of(&h, &key).await;
    assert_eq!(record.status, JobStatus::Completed);
    assert!(record.reason.is_empty());
    assert!(record.updated_at >= record.created_at);
    assert_eq!(h.queue.ready_len(), 0);
    assert_eq!(h.queue.inflight_len(), 0);
}

#[tokio::test]
async fn translate_creates_derived_item_and_publishes_event() {
    let h = harness();
    let todo = h.todos.insert("Buy milk", "user-1", "active");

    let key = h
        .submitter
        .submit(
            owner("user-1"),
            JobPayload::Translate {
                todo_item_id: todo.id.clone(),
                owner_id: "user-1".into(),
            },
        )
        .await
        .unwrap();

    let disposition = h.worker.process_batch(h.queue.receive_batch(10)).await;
    assert!(disposition.is_clean());
    assert_eq!(status_of(&h, &key).await.status, JobStatus::Completed);

    let derived: Vec<_> = h
        .todos
        .items()
        .into_iter()
        .filter(|item| item.id != todo.id)
        .collect();
    assert_eq!(derived.len(), 1);
    assert_eq!(derived[0].title, "Buy milk (ja)");
    assert!(derived[0].description.contains("Translated from: Buy milk"));
    assert_eq!(derived[0].owner_id, "user-1");
    assert_eq!(derived[0].status, "active");

    let events = h.events.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].channel, "user-1/jobs");
    assert_eq!(events[0].payload["type"], "completed");
}

#[tokio::test]
async fn translate_missing_todo_completes_without_side_effects() {
    let h = harness();
    let key = h
        .submitter
        .submit(
            owner("user-2"),
            JobPayload::Translate {
                todo_item_id: "abc".into(),
                owner_id: "user-2".into(),
            },
        )
        .await
        .unwrap();

    let disposition = h.worker.process_batch(h.queue.receive_batch(10)).await;

    // Missing input is not a failure: the job completes quietly.
    assert!(disposition.is_clean());
    assert_eq!(status_of(&h, &key).await.status, JobStatus::Completed);
    assert!(h.todos.is_empty());
    assert!(h.events.is_empty());
    assert!(h.translator.calls().is_empty());
}

#[tokio::test]
async fn translate_failure_marks_failed_then_succeeds_on_redelivery() {
    let h = harness();
    let todo = h.todos.insert("Buy milk", "user-1", "active");
    h.translator.fail_with("translate service unavailable");

    let key = h
        .submitter
        .submit(
            owner("user-1"),
            JobPayload::Translate {
                todo_item_id: todo.id,
                owner_id: "user-1".into(),
            },
        )
        .await
        .unwrap();

    let disposition = h.worker.process_batch(h.queue.receive_batch(10)).await;
    assert_eq!(disposition.failure_count(), 1);

    let record = status_of(&h, &key).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.reason.contains("translate service unavailable"));

    // The transport makes the failed message visible again.
    h.queue.settle(&disposition);
    assert_eq!(h.queue.ready_len(), 1);

    // Second attempt with a healthy translator re-enters running and
    // lands terminal completed.
    h.translator.clear_failure();
    let batch = h.queue.receive_batch(10);
    assert_eq!(batch[0].receive_count, 2);
    let disposition = h.worker.process_batch(batch).await;
    assert!(disposition.is_clean());
    assert_eq!(status_of(&h, &key).await.status, JobStatus::Completed);
}

#[tokio::test]
async fn partial_batch_failure_isolates_the_failing_message() {
    let h = harness();
    let todo = h.todos.insert("Buy milk", "user-1", "active");
    h.translator.fail_with("downstream down");

    let ok_a = h
        .submitter
        .submit(owner("user-1"), JobPayload::Example {})
        .await
        .unwrap();
    let failing = h
        .submitter
        .submit(
            owner("user-1"),
            JobPayload::Translate {
                todo_item_id: todo.id,
                owner_id: "user-1".into(),
            },
        )
        .await
        .unwrap();
    let ok_b = h
        .submitter
        .submit(owner("user-1"), JobPayload::Example {})
        .await
        .unwrap();

    let disposition = h.worker.process_batch(h.queue.receive_batch(10)).await;
    assert_eq!(disposition.failure_count(), 1);

    assert_eq!(status_of(&h, &ok_a).await.status, JobStatus::Completed);
    assert_eq!(status_of(&h, &ok_b).await.status, JobStatus::Completed);
    assert_eq!(status_of(&h, &failing).await.status, JobStatus::Failed);

    // Only the failed message is redelivered, not the whole batch.
    h.queue.settle(&disposition);
    assert_eq!(h.queue.ready_len(), 1);
}

#[tokio::test]
async fn redelivered_message_after_completion_is_acknowledged() {
    let h = harness();
    let key = h
        .submitter
        .submit(owner("user-1"), JobPayload::Example {})
        .await
        .unwrap();

    let batch = h.queue.receive_batch(10);
    let duplicate = Delivery {
        message_id: batch[0].message_id,
        body: batch[0].body.clone(),
        receive_count: batch[0].receive_count + 1,
    };

    let first = h.worker.process_batch(batch).await;
    assert!(first.is_clean());
    assert_eq!(status_of(&h, &key).await.status, JobStatus::Completed);

    // At-least-once duplicate: acknowledged without regressing status.
    let second = h.worker.process_batch(vec![duplicate]).await;
    assert!(second.is_clean());
    assert_eq!(status_of(&h, &key).await.status, JobStatus::Completed);
}

#[tokio::test]
async fn unknown_job_type_fails_loudly_and_marks_record() {
    use remora::store::JobStore as _;

    let h = harness();
    let key = JobKey::new(owner("user-1"), 1700000000000);
    h.store
        .create(JobRecord::pending(key.clone(), remora::JobKind::Example))
        .await
        .unwrap();

    let body = format!(
        r#"{{"key":{},"payload":{{"type":"definitely-not-a-job"}}}}"#,
        serde_json::to_string(&key).unwrap()
    );
    let delivery = Delivery {
        message_id: uuid::Uuid::now_v7(),
        body,
        receive_count: 1,
    };

    let disposition = h.worker.process_batch(vec![delivery]).await;
    assert_eq!(disposition.failure_count(), 1);

    let record = status_of(&h, &key).await;
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.reason.contains("unrecognized job type"));
}

#[tokio::test]
async fn reinvoke_recovers_a_stuck_pending_job() {
    use remora::store::JobStore as _;

    let h = harness();
    h.queue.fail_next_publish();
    let err = h
        .submitter
        .submit(owner("user-1"), JobPayload::Example {})
        .await
        .unwrap_err();
    assert!(err.to_string().contains("publish failed"));

    // The record exists but no message does: the documented gap an
    // operator closes by reinvoking the worker with an explicit payload.
    let records = h.store.list_owner(&owner("user-1")).await.unwrap();
    let key = records[0].key.clone();
    assert_eq!(records[0].status, JobStatus::Pending);

    h.worker
        .reinvoke(&JobMessage::new(key.clone(), JobPayload::Example {}))
        .await
        .unwrap();
    assert_eq!(status_of(&h, &key).await.status, JobStatus::Completed);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn invocations_are_single_flight_by_default() {
    let h = harness_with(WorkerConfig {
        invocation_permits: 1,
        example_job_delay_ms: 150,
    });

    for _ in 0..2 {
        h.submitter
            .submit(owner("user-1"), JobPayload::Example {})
            .await
            .unwrap();
    }
    let first = h.queue.receive_batch(1);
    let second = h.queue.receive_batch(1);

    let started = Instant::now();
    let w1 = Arc::clone(&h.worker);
    let w2 = Arc::clone(&h.worker);
    let (d1, d2) = tokio::join!(
        tokio::spawn(async move { w1.process_batch(first).await }),
        tokio::spawn(async move { w2.process_batch(second).await }),
    );
    assert!(d1.unwrap().is_clean());
    assert!(d2.unwrap().is_clean());

    // With a single invocation permit the two batches cannot overlap, so
    // total time is at least two sequential example-job delays.
    assert!(
        started.elapsed() >= Duration::from_millis(280),
        "batches overlapped under a single invocation permit"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn messages_within_one_batch_run_concurrently() {
    let h = harness_with(WorkerConfig {
        invocation_permits: 1,
        example_job_delay_ms: 150,
    });

    for _ in 0..4 {
        h.submitter
            .submit(owner("user-1"), JobPayload::Example {})
            .await
            .unwrap();
    }

    let started = Instant::now();
    let disposition = h.worker.process_batch(h.queue.receive_batch(10)).await;
    assert!(disposition.is_clean());

    // Four 150ms jobs in one invocation settle together, not serially.
    assert!(
        started.elapsed() < Duration::from_millis(450),
        "batch members ran sequentially"
    );
}
