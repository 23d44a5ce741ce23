use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity of the principal that submitted a job.
///
/// Owners partition the job keyspace; all of an owner's jobs share the
/// same partition component and are ordered by submission timestamp.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    /// Create an owner identity. The empty string is rejected.
    pub fn new(id: impl Into<String>) -> anyhow::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            anyhow::bail!("owner id must be non-empty");
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Composite key addressing one job record.
///
/// The owner forms the partition component and the submission timestamp
/// (epoch milliseconds) the sort component. A submitter issues strictly
/// increasing timestamps per process, so keys are unique per
/// `(owner, submitted_at_ms)` pair.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct JobKey {
    pub owner: OwnerId,
    pub submitted_at_ms: i64,
}

impl JobKey {
    pub fn new(owner: OwnerId, submitted_at_ms: i64) -> Self {
        Self {
            owner,
            submitted_at_ms,
        }
    }

    /// Submission time as a UTC timestamp.
    ///
    /// A timestamp outside chrono's representable range saturates to
    /// `MIN_UTC`/`MAX_UTC` rather than masquerading as a plausible time;
    /// such a key is corrupt and should look corrupt.
    pub fn submitted_at(&self) -> DateTime<Utc> {
        match DateTime::from_timestamp_millis(self.submitted_at_ms) {
            Some(at) => at,
            None if self.submitted_at_ms < 0 => DateTime::<Utc>::MIN_UTC,
            None => DateTime::<Utc>::MAX_UTC,
        }
    }
}

impl Display for JobKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JOB#{}#{}", self.owner, self.submitted_at_ms)
    }
}

/// Discriminator selecting which handler processes a job.
///
/// The set is closed: adding a job type means adding a variant here and
/// a matching [`crate::JobPayload`] variant, and the compiler walks you
/// through every dispatch site.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Slow no-op sample job.
    Example,
    /// Translate a todo item's title and create a derived record.
    Translate,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Example => "example",
            JobKind::Translate => "translate",
        }
    }
}

impl Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a job record.
///
/// Status only moves forward: `Pending -> Running -> {Completed, Failed}`.
/// `Running` may be re-entered from `Failed` (and concurrently from
/// `Running` itself) because queue delivery is at-least-once; the one
/// hard stop is `Completed`, which is never left.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status is terminal for the happy path.
    ///
    /// `Failed` is terminal for a single attempt but a redelivered
    /// message may still move the record back through `Running`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the forward-only state machine permits `self -> next`.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        match next {
            // Re-entrant under redelivery; only a completed job is closed.
            JobStatus::Running => !matches!(self, JobStatus::Completed),
            JobStatus::Completed => matches!(self, JobStatus::Running),
            // Pending -> Failed covers the dispatch-defect path where a
            // message decodes a key but no recognizable payload.
            JobStatus::Failed => matches!(self, JobStatus::Pending | JobStatus::Running),
            JobStatus::Pending => false,
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// Persisted state of one submitted unit of asynchronous work.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JobRecord {
    pub key: JobKey,
    pub kind: JobKind,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Failure detail; empty unless `status` is `Failed`.
    pub reason: String,
}

impl JobRecord {
    /// Build the initial record for a fresh submission.
    ///
    /// `created_at` and `updated_at` both come from the key's timestamp
    /// component so the record and its key agree on submission time.
    pub fn pending(key: JobKey, kind: JobKind) -> Self {
        let at = key.submitted_at();
        Self {
            key,
            kind,
            status: JobStatus::Pending,
            created_at: at,
            updated_at: at,
            reason: String::new(),
        }
    }
}
