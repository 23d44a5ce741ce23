//! Tracing spans and metric recording for the job lifecycle.
//!
//! Span helpers are always available; the `record_*` functions become
//! no-ops unless the `metrics` feature is enabled.

use tracing::{info_span, Span};

use crate::job::{JobKey, JobKind};

/// Span covering one job submission.
#[must_use]
pub fn submit_span(owner: &str, kind: JobKind) -> Span {
    info_span!(
        "remora.submit",
        owner = %owner,
        job_kind = %kind,
    )
}

/// Span covering one worker invocation over a batch.
#[must_use]
pub fn batch_span(batch_size: usize) -> Span {
    info_span!("remora.batch", batch_size)
}

/// Span covering one job's dispatch, from `running` to terminal.
#[must_use]
pub fn dispatch_span(key: &JobKey, kind: JobKind) -> Span {
    info_span!(
        "remora.dispatch",
        job = %key,
        job_kind = %kind,
    )
}

/// Count a submitted job.
pub fn record_job_submitted(kind: JobKind) {
    #[cfg(feature = "metrics")]
    crate::metrics::JOBS_SUBMITTED_TOTAL
        .with_label_values(&[kind.as_str()])
        .inc();
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}

/// Count a job reaching a terminal status (`completed` or `failed`).
pub fn record_job_finished(kind: JobKind, outcome: &str) {
    #[cfg(feature = "metrics")]
    crate::metrics::JOBS_FINISHED_TOTAL
        .with_label_values(&[kind.as_str(), outcome])
        .inc();
    #[cfg(not(feature = "metrics"))]
    let _ = (kind, outcome);
}

/// Observe the size of a delivered batch.
pub fn record_batch_size(size: usize) {
    #[cfg(feature = "metrics")]
    crate::metrics::BATCH_SIZE.observe(size as f64);
    #[cfg(not(feature = "metrics"))]
    let _ = size;
}
