//! Prometheus metrics for job throughput, behind the `metrics` feature.
//!
//! # Metrics
//!
//! - `remora_jobs_submitted_total{job_kind}` - jobs accepted by the submitter
//! - `remora_jobs_finished_total{job_kind,outcome}` - jobs reaching a terminal status
//! - `remora_batch_size` - messages per worker invocation
#![cfg(feature = "metrics")]

use prometheus::{exponential_buckets, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::LazyLock;

/// Crate-local Prometheus registry.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Counter for jobs accepted by the submitter.
pub static JOBS_SUBMITTED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "remora_jobs_submitted_total",
        "Total number of jobs submitted",
    );
    let counter = CounterVec::new(opts, &["job_kind"])
        .expect("remora_jobs_submitted_total metric creation failed");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("remora_jobs_submitted_total registration failed");
    counter
});

/// Counter for jobs reaching `completed` or `failed`.
pub static JOBS_FINISHED_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        "remora_jobs_finished_total",
        "Total number of jobs reaching a terminal status",
    );
    let counter = CounterVec::new(opts, &["job_kind", "outcome"])
        .expect("remora_jobs_finished_total metric creation failed");
    REGISTRY
        .register(Box::new(counter.clone()))
        .expect("remora_jobs_finished_total registration failed");
    counter
});

/// Histogram of delivered batch sizes.
pub static BATCH_SIZE: LazyLock<Histogram> = LazyLock::new(|| {
    let opts = HistogramOpts::new("remora_batch_size", "Messages per worker invocation").buckets(
        exponential_buckets(1.0, 2.0, 8).expect("remora_batch_size bucket creation failed"),
    );
    let histogram =
        Histogram::with_opts(opts).expect("remora_batch_size metric creation failed");
    REGISTRY
        .register(Box::new(histogram.clone()))
        .expect("remora_batch_size registration failed");
    histogram
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statics_register_against_the_crate_registry() {
        JOBS_SUBMITTED_TOTAL.with_label_values(&["example"]).inc();
        JOBS_FINISHED_TOTAL
            .with_label_values(&["example", "completed"])
            .inc();
        BATCH_SIZE.observe(3.0);

        let encoder = prometheus::TextEncoder::new();
        let rendered = encoder
            .encode_to_string(&REGISTRY.gather())
            .expect("metrics encoding failed");
        assert!(rendered.contains("remora_jobs_submitted_total"));
        assert!(rendered.contains("remora_jobs_finished_total"));
        assert!(rendered.contains("remora_batch_size"));
    }
}
