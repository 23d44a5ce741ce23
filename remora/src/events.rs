use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

/// Downstream event boundary: best-effort, fire-and-forget notification
/// that something interesting happened on a channel.
///
/// Handlers treat publish failure as loggable, never as job failure.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn send_event(&self, channel: &str, payload: Value) -> anyhow::Result<()>;
}

/// An event as observed by in-process subscribers.
#[derive(Clone, Debug)]
pub struct ChannelEvent {
    pub channel: String,
    pub payload: Value,
}

/// In-process [`EventSink`] fanning events out over a tokio broadcast
/// channel.
///
/// Non-blocking publish: a slow subscriber lags (`RecvError::Lagged`)
/// rather than holding up the publisher, and with no subscribers at all
/// events are dropped silently.
pub struct InProcEventSink {
    sender: broadcast::Sender<ChannelEvent>,
    capacity: usize,
}

impl std::fmt::Debug for InProcEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InProcEventSink")
            .field("capacity", &self.capacity)
            .field("subscribers", &self.sender.receiver_count())
            .finish()
    }
}

impl InProcEventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    /// Subscribe to events published after this call. Each subscriber
    /// receives its own clone of every event.
    pub fn subscribe(&self) -> broadcast::Receiver<ChannelEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[async_trait]
impl EventSink for InProcEventSink {
    async fn send_event(&self, channel: &str, payload: Value) -> anyhow::Result<()> {
        let _ = self.sender.send(ChannelEvent {
            channel: channel.to_string(),
            payload,
        });
        Ok(())
    }
}
