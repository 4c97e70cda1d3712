//! In-process event source for local runs and tests.

use async_trait::async_trait;
use dashmap::DashMap;
use futures_util::StreamExt;
use nef_core::ue_state::snapshot_key;
use nef_core::{CoreNetworkEvent, UeState, UeStateUpdate};
use tokio::sync::broadcast;
use tracing::warn;

use super::{ConnectorError, EventListener, EventSource};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
pub struct MemoryEventSource {
    snapshots: DashMap<String, UeState>,
    channels: DashMap<String, broadcast::Sender<String>>,
}

impl MemoryEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_snapshot(&self, subject_id: &str, state: UeState) {
        self.snapshots.insert(subject_id.to_string(), state);
    }

    /// Publishes a raw payload; returns how many listeners received it.
    pub fn publish_raw(&self, subject_id: &str, event: CoreNetworkEvent, payload: &str) -> usize {
        let channel = event.channel_for(subject_id);
        let delivered = match self.channels.get(&channel) {
            Some(sender) => sender.send(payload.to_string()).unwrap_or(0),
            None => return 0,
        };
        if delivered == 0 {
            self.channels
                .remove_if(&channel, |_, sender| sender.receiver_count() == 0);
        }
        delivered
    }

    /// Publishes an update on the channel `event` of its subject.
    pub fn publish(&self, event: CoreNetworkEvent, update: &UeStateUpdate) -> usize {
        match serde_json::to_string(update) {
            Ok(payload) => self.publish_raw(&update.subject_id, event, &payload),
            Err(e) => {
                warn!(error = %e, "Failed to serialize UE update");
                0
            }
        }
    }

    /// Number of open listeners on a subscriber channel.
    pub fn listener_count(&self, subject_id: &str, event: CoreNetworkEvent) -> usize {
        self.channels
            .get(&event.channel_for(subject_id))
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Number of channels currently kept, live or not yet pruned.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[async_trait]
impl EventSource for MemoryEventSource {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn fetch_snapshot(&self, subject_id: &str) -> Result<UeState, ConnectorError> {
        self.snapshots
            .get(subject_id)
            .map(|state| state.clone())
            .ok_or_else(|| ConnectorError::NotFound(snapshot_key(subject_id)))
    }

    async fn subscribe(
        &self,
        subject_id: &str,
        event: CoreNetworkEvent,
    ) -> Result<EventListener, ConnectorError> {
        let channel = event.channel_for(subject_id);
        // Channels whose listeners are all gone are dropped here
        self.channels
            .retain(|_, sender| sender.receiver_count() > 0);
        let receiver = self
            .channels
            .entry(channel.clone())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe();

        let log_channel = channel.clone();
        let stream = futures_util::stream::unfold(receiver, move |mut receiver| {
            let channel = log_channel.clone();
            async move {
                loop {
                    match receiver.recv().await {
                        Ok(payload) => return Some((payload, receiver)),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(channel = %channel, skipped, "Listener lagged, updates dropped");
                        }
                        Err(broadcast::error::RecvError::Closed) => return None,
                    }
                }
            }
        })
        .boxed();

        Ok(EventListener::new(channel, stream))
    }
}
