use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use remora::job::{JobKey, JobRecord, JobStatus, OwnerId};
use remora::store::{JobStore, StoreError};

/// In-memory [`JobStore`] over a `BTreeMap`, so an owner's records come
/// back in submission order like a partition/sort-key table.
#[derive(Default)]
pub struct InMemoryJobStore {
    records: Mutex<BTreeMap<JobKey, JobRecord>>,
    fail_next_create: Mutex<bool>,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `create` call fail, for exercising the
    /// nothing-persisted-nothing-published submission guarantee.
    pub fn fail_next_create(&self) {
        *self.fail_next_create.lock() = true;
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Test helper: rewrite a record's `updated_at`, e.g. to age a job
    /// into sweep range.
    pub fn backdate(&self, key: &JobKey, updated_at: DateTime<Utc>) {
        if let Some(record) = self.records.lock().get_mut(key) {
            record.updated_at = updated_at;
        }
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create(&self, record: JobRecord) -> Result<(), StoreError> {
        {
            let mut fail = self.fail_next_create.lock();
            if *fail {
                *fail = false;
                return Err(StoreError::Backend(anyhow::anyhow!(
                    "simulated create failure"
                )));
            }
        }
        let mut records = self.records.lock();
        if records.contains_key(&record.key) {
            return Err(StoreError::DuplicateKey(record.key));
        }
        records.insert(record.key.clone(), record);
        Ok(())
    }

    async fn transition(
        &self,
        key: &JobKey,
        status: JobStatus,
        reason: Option<String>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(key)
            .ok_or_else(|| StoreError::MissingRecord(key.clone()))?;

        if !record.status.can_transition_to(status) {
            return Err(StoreError::InvalidTransition {
                key: key.clone(),
                from: record.status,
                to: status,
            });
        }

        record.status = status;
        record.updated_at = Utc::now();
        record.reason = reason.unwrap_or_default();
        Ok(())
    }

    async fn get(&self, key: &JobKey) -> Result<Option<JobRecord>, StoreError> {
        Ok(self.records.lock().get(key).cloned())
    }

    async fn list_owner(&self, owner: &OwnerId) -> Result<Vec<JobRecord>, StoreError> {
        let records = self.records.lock();
        Ok(records
            .values()
            .filter(|record| &record.key.owner == owner)
            .cloned()
            .collect())
    }

    async fn scan_stuck(&self, older_than: DateTime<Utc>) -> Result<Vec<JobRecord>, StoreError> {
        let records = self.records.lock();
        Ok(records
            .values()
            .filter(|record| !record.status.is_terminal() && record.updated_at <= older_than)
            .cloned()
            .collect())
    }
}
