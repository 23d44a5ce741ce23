use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;
use uuid::Uuid;

use remora::payload::JobMessage;
use remora::queue::{BatchDisposition, Delivery, WorkQueue};

/// In-memory [`WorkQueue`] modelling the at-least-once transport.
///
/// [`receive_batch`](Self::receive_batch) hides delivered messages
/// (inflight), [`settle`](Self::settle) acknowledges the batch: failed
/// deliveries go back to ready, or to the dead bucket once their
/// receive count reaches `max_receives`. [`expire_inflight`](Self::expire_inflight)
/// simulates a visibility timeout elapsing mid-invocation, returning
/// everything inflight to ready for redelivery.
pub struct InMemoryWorkQueue {
    inner: Mutex<QueueState>,
}

struct QueueState {
    ready: VecDeque<StoredMessage>,
    inflight: HashMap<Uuid, StoredMessage>,
    dead: Vec<StoredMessage>,
    max_receives: u32,
    fail_next_publish: bool,
}

#[derive(Clone, Debug)]
struct StoredMessage {
    message_id: Uuid,
    body: String,
    receive_count: u32,
}

impl InMemoryWorkQueue {
    pub fn new() -> Self {
        Self::with_max_receives(5)
    }

    /// Queue whose messages dead-letter after `max_receives` deliveries.
    pub fn with_max_receives(max_receives: u32) -> Self {
        Self {
            inner: Mutex::new(QueueState {
                ready: VecDeque::new(),
                inflight: HashMap::new(),
                dead: Vec::new(),
                max_receives,
                fail_next_publish: false,
            }),
        }
    }

    /// Make the next `publish` call fail, for exercising the
    /// record-without-message submission gap.
    pub fn fail_next_publish(&self) {
        self.inner.lock().fail_next_publish = true;
    }

    /// Deliver up to `max` ready messages, hiding them until settled.
    pub fn receive_batch(&self, max: usize) -> Vec<Delivery> {
        let mut state = self.inner.lock();
        let mut batch = Vec::new();
        while batch.len() < max {
            let Some(mut stored) = state.ready.pop_front() else {
                break;
            };
            stored.receive_count += 1;
            batch.push(Delivery {
                message_id: stored.message_id,
                body: stored.body.clone(),
                receive_count: stored.receive_count,
            });
            state.inflight.insert(stored.message_id, stored);
        }
        batch
    }

    /// Apply a worker invocation's outcome: acknowledged messages are
    /// dropped, failed ones become visible again or dead-letter.
    /// Deliveries belonging to other still-unsettled batches stay
    /// inflight untouched.
    pub fn settle(&self, disposition: &BatchDisposition) {
        let mut state = self.inner.lock();
        for message_id in disposition.failed_ids() {
            if let Some(stored) = state.inflight.remove(message_id) {
                if stored.receive_count >= state.max_receives {
                    tracing::warn!(message_id = %stored.message_id, "message dead-lettered");
                    state.dead.push(stored);
                } else {
                    state.ready.push_back(stored);
                }
            }
        }
        for message_id in disposition.acknowledged_ids() {
            state.inflight.remove(message_id);
        }
    }

    /// Return every inflight message to ready, as if the visibility
    /// timeout expired before the invocation settled.
    pub fn expire_inflight(&self) {
        let mut state = self.inner.lock();
        let expired: Vec<StoredMessage> = state.inflight.drain().map(|(_, m)| m).collect();
        for stored in expired {
            state.ready.push_back(stored);
        }
    }

    pub fn ready_len(&self) -> usize {
        self.inner.lock().ready.len()
    }

    pub fn inflight_len(&self) -> usize {
        self.inner.lock().inflight.len()
    }

    pub fn dead_len(&self) -> usize {
        self.inner.lock().dead.len()
    }
}

impl Default for InMemoryWorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkQueue for InMemoryWorkQueue {
    async fn publish(&self, message: &JobMessage) -> anyhow::Result<()> {
        let body = message.encode()?;
        let mut state = self.inner.lock();
        if state.fail_next_publish {
            state.fail_next_publish = false;
            anyhow::bail!("simulated publish failure");
        }
        state.ready.push_back(StoredMessage {
            message_id: Uuid::now_v7(),
            body,
            receive_count: 0,
        });
        Ok(())
    }
}
