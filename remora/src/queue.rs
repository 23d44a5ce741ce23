use async_trait::async_trait;
use uuid::Uuid;

use crate::payload::JobMessage;

/// At-least-once delivery transport between submitter and worker.
///
/// The transport owns delivery: it hands the worker batches of
/// [`Delivery`] values and applies visibility-timeout redelivery to
/// whatever the returned [`BatchDisposition`] reports as failed. No
/// ordering and no deduplication are assumed.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Publish one job message.
    async fn publish(&self, message: &JobMessage) -> anyhow::Result<()>;
}

/// One delivered queue message, as handed to the worker by the transport.
#[derive(Clone, Debug)]
pub struct Delivery {
    /// Transport-assigned id, stable across redeliveries of the same
    /// message.
    pub message_id: Uuid,
    /// Serialized [`JobMessage`] body.
    pub body: String,
    /// How many times this message has been delivered, this one included.
    pub receive_count: u32,
}

impl Delivery {
    /// First delivery of a freshly encoded message. The transport is the
    /// usual producer of deliveries; this constructor exists for the
    /// operator escape hatch and for tests.
    pub fn first(message: &JobMessage) -> anyhow::Result<Self> {
        Ok(Self {
            message_id: Uuid::now_v7(),
            body: message.encode()?,
            receive_count: 1,
        })
    }
}

/// Per-invocation outcome reported back to the transport.
///
/// Every delivery in the batch lands in exactly one list: failed
/// deliveries become visible again for redelivery, acknowledged ones
/// are dropped. Scoping both lists to this batch keeps settlement from
/// touching deliveries that belong to some other invocation still in
/// flight. This is what makes batch failure partial: the transport
/// redelivers the failed subset, not the whole batch.
#[derive(Clone, Debug, Default)]
pub struct BatchDisposition {
    failed: Vec<Uuid>,
    acknowledged: Vec<Uuid>,
}

impl BatchDisposition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_failure(&mut self, message_id: Uuid) {
        self.failed.push(message_id);
    }

    pub fn record_success(&mut self, message_id: Uuid) {
        self.acknowledged.push(message_id);
    }

    /// Ids of deliveries the transport should make visible again.
    pub fn failed_ids(&self) -> &[Uuid] {
        &self.failed
    }

    /// Ids of deliveries the transport should drop.
    pub fn acknowledged_ids(&self) -> &[Uuid] {
        &self.acknowledged
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    /// True when every delivery in the batch succeeded.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_partitions_the_batch() {
        let mut disposition = BatchDisposition::new();
        assert!(disposition.is_clean());

        let failed = Uuid::now_v7();
        let acked = Uuid::now_v7();
        disposition.record_failure(failed);
        disposition.record_success(acked);

        assert!(!disposition.is_clean());
        assert_eq!(disposition.failure_count(), 1);
        assert_eq!(disposition.failed_ids(), &[failed]);
        assert_eq!(disposition.acknowledged_ids(), &[acked]);
    }
}
