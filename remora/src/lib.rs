//! Remora - the asynchronous job subsystem of a serverless CRUD app.
//!
//! A client submits a unit of work, the system persists a job record,
//! enqueues a message, a worker consumes the message, drives the record
//! through its status state machine, and records the outcome. Retry and
//! partial-failure semantics come from the at-least-once queue boundary.
//!
//! # Core Concepts
//!
//! - **Job record**: The persisted state of one submitted unit of work,
//!   keyed by owner and submission timestamp. See [`JobRecord`].
//!
//! - **Job message**: The transient queue payload carrying the job key
//!   and typed input to the worker. See [`JobMessage`].
//!
//! - **Submitter**: Writes the record, then publishes the message, in
//!   that order, so every delivered key resolves to a record. See
//!   [`JobSubmitter`].
//!
//! - **Worker**: Consumes delivered batches, dispatches by job type
//!   over a closed payload enum, and reports partial-batch failure back
//!   to the transport. See [`JobWorker`].
//!
//! - **Sweep**: Observes jobs stuck short of a terminal status for
//!   operator remediation. See [`ReconciliationSweep`].
//!
//! # Feature Flags
//!
//! - `metrics` - Prometheus metrics support
//!
//! # Example
//!
//! ```ignore
//! use remora::*;
//! use std::sync::Arc;
//!
//! let submitter = JobSubmitter::new(store.clone(), queue.clone());
//! let key = submitter
//!     .submit(OwnerId::new("user-1")?, JobPayload::Example {})
//!     .await?;
//!
//! let worker = JobWorker::new(store, handlers, &WorkerConfig::default());
//! let disposition = worker.process_batch(batch).await;
//! ```

pub mod config;
pub mod events;
pub mod handlers;
pub mod job;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod payload;
pub mod queue;
pub mod store;
pub mod submit;
pub mod sweep;
pub mod telemetry;
pub mod worker;

pub use config::{SweepConfig, WorkerConfig};
pub use events::{ChannelEvent, EventSink, InProcEventSink};
pub use handlers::{JobHandlers, NewTodoItem, TodoItem, TodoStore, Translation, Translator};
pub use job::{JobKey, JobKind, JobRecord, JobStatus, OwnerId};
pub use payload::{decode_message, JobMessage, JobPayload, MessageDecodeError};
pub use queue::{BatchDisposition, Delivery, WorkQueue};
pub use store::{JobStore, StoreError};
pub use submit::JobSubmitter;
pub use sweep::{ReconciliationSweep, SweepReport};
pub use worker::JobWorker;
