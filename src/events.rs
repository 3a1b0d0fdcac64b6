//! In-process change notification.
//!
//! Every successful collection save publishes a [`StoreEvent`] on a broadcast
//! channel. Interested parties (dashboard pollers, cache maintenance, the
//! startup trace listener) subscribe instead of re-reading files blindly.

use tokio::sync::broadcast;

use crate::store::RecordKind;

const CHANNEL_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreEvent {
    pub kind: RecordKind,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Send errors only mean "nobody is listening right now".
    pub fn publish(&self, kind: RecordKind) {
        let _ = self.tx.send(StoreEvent { kind });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
