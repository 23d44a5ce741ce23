use serde::{Deserialize, Serialize};

/// Configuration for the job worker.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Number of worker invocations allowed to run at once, process-wide.
    /// The default of 1 is global single-flight: one batch at a time,
    /// protecting shared downstream resources from overload.
    pub invocation_permits: usize,
    /// Simulated work duration for the example job, in milliseconds.
    pub example_job_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            invocation_permits: 1,
            example_job_delay_ms: 5000,
        }
    }
}

/// Configuration for the reconciliation sweep thresholds.
///
/// A `pending` job older than its threshold most likely lost its queue
/// message; a `running` one most likely lost its finalization write.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Age in seconds past which a `pending` job counts as stuck.
    pub pending_age_secs: u64,
    /// Age in seconds past which a `running` job counts as stuck.
    pub running_age_secs: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            pending_age_secs: 600,
            running_age_secs: 1800,
        }
    }
}
