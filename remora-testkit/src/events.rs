use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use remora::events::{ChannelEvent, EventSink};

/// [`EventSink`] fake that records every published event.
#[derive(Default)]
pub struct CapturingEventSink {
    events: Mutex<Vec<ChannelEvent>>,
}

impl CapturingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChannelEvent> {
        self.events.lock().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

#[async_trait]
impl EventSink for CapturingEventSink {
    async fn send_event(&self, channel: &str, payload: Value) -> anyhow::Result<()> {
        self.events.lock().push(ChannelEvent {
            channel: channel.to_string(),
            payload,
        });
        Ok(())
    }
}
