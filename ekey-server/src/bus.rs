//! In-process event bus
//!
//! Every accepted notification is fired as a [`BusEvent`] on a tokio
//! broadcast channel. Listeners subscribe and receive their own copy; a
//! listener that falls behind loses the oldest events.

use chrono::{DateTime, Utc};
use ekey_core::ResolvedEvent;
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

/// A fired event as seen by listeners.
#[derive(Debug, Clone, Serialize)]
pub struct BusEvent {
    pub id: Uuid,
    pub event_type: &'static str,
    pub time_fired: DateTime<Utc>,
    pub data: ResolvedEvent,
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BusEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Fire an event. Having no listeners is not an error.
    pub fn fire(&self, event_type: &'static str, data: ResolvedEvent) -> BusEvent {
        let event = BusEvent {
            id: Uuid::new_v4(),
            event_type,
            time_fired: Utc::now(),
            data,
        };

        let listeners = self.tx.send(event.clone()).unwrap_or(0);
        tracing::debug!(event_type, id = %event.id, listeners, "Fired bus event");
        event
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusEvent> {
        self.tx.subscribe()
    }
}

/// Spawn a listener that writes every bus event to the log.
pub fn spawn_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => {
                    tracing::debug!(
                        event_type = event.event_type,
                        id = %event.id,
                        user = event.data.display_user(),
                        result = %event.data.result_name,
                        "Bus event"
                    );
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Bus logger fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}
