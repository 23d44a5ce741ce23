use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::job::{JobKey, JobRecord, JobStatus, OwnerId};

/// Errors surfaced by a [`JobStore`] backend.
///
/// Duplicate keys, missing records, and rejected transitions are
/// distinct from infrastructure failure so callers and operators can
/// tell a logic defect apart from a flaky backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// `create` would silently overwrite an existing record.
    #[error("job record already exists: {0}")]
    DuplicateKey(JobKey),
    /// `transition` addressed a record that does not exist. Should not
    /// happen while submit-before-publish holds, so it gets its own
    /// variant for observability.
    #[error("job record not found: {0}")]
    MissingRecord(JobKey),
    /// `transition` would move the record backwards through the state
    /// machine (e.g. out of `Completed`).
    #[error("invalid status transition {from} -> {to} for {key}")]
    InvalidTransition {
        key: JobKey,
        from: JobStatus,
        to: JobStatus,
    },
    /// The backing store itself failed.
    #[error("store backend failure")]
    Backend(#[from] anyhow::Error),
}

/// Durable key-value record of job identity, status, and timestamps.
///
/// Single-record atomicity only; no cross-record transactions are
/// assumed. The submitter exclusively creates records, the worker
/// exclusively transitions them afterwards.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Persist a fresh record. Fails with [`StoreError::DuplicateKey`]
    /// if the composite key is already present.
    async fn create(&self, record: JobRecord) -> Result<(), StoreError>;

    /// Overwrite status, `updated_at`, and `reason` on the addressed
    /// record. `reason` is cleared when `None`. Implementations enforce
    /// [`JobStatus::can_transition_to`] and fail with
    /// [`StoreError::MissingRecord`] when the record does not exist.
    async fn transition(
        &self,
        key: &JobKey,
        status: JobStatus,
        reason: Option<String>,
    ) -> Result<(), StoreError>;

    /// Point read of one record.
    async fn get(&self, key: &JobKey) -> Result<Option<JobRecord>, StoreError>;

    /// Range read of an owner's records, ordered by submission time.
    async fn list_owner(&self, owner: &OwnerId) -> Result<Vec<JobRecord>, StoreError>;

    /// Non-terminal records whose last transition is older than the
    /// cutoff. Feeds the reconciliation sweep; implementations may scan.
    async fn scan_stuck(&self, older_than: DateTime<Utc>) -> Result<Vec<JobRecord>, StoreError>;
}
