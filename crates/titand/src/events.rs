//! Event bus for daemon notifications
//!
//! Explicitly owned broadcast channel; components publish through a cloned
//! handle and any number of subscribers receive every event.

use titan_common::{EventKind, TitanEvent};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const DEFAULT_CAPACITY: usize = 256;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<TitanEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TitanEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub fn publish(&self, kind: EventKind) {
        let name = kind.name();
        match self.sender.send(TitanEvent::new(kind)) {
            Ok(receivers) => debug!("Event {} delivered to {} subscriber(s)", name, receivers),
            Err(_) => debug!("Event {} dropped (no subscribers)", name),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Log every event until the bus is dropped
pub fn spawn_logger(bus: &EventBus) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event.kind) {
                    Ok(json) => info!(target: "titan::events", "{}", json),
                    Err(e) => warn!("Cannot serialize event {}: {}", event.kind.name(), e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event logger lagged, {} events skipped", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(EventKind::MonitoringStopped);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribers_receive_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        bus.publish(EventKind::MonitoringStarted { interval_ms: 1000 });
        bus.publish(EventKind::MonitoringStopped);

        assert_eq!(rx.recv().await.unwrap().kind.name(), "monitoring_started");
        assert_eq!(rx.recv().await.unwrap().kind.name(), "monitoring_stopped");
    }

    #[tokio::test]
    async fn test_logger_exits_when_bus_dropped() {
        let bus = EventBus::new();
        let handle = spawn_logger(&bus);
        assert_eq!(bus.subscriber_count(), 1);

        bus.publish(EventKind::MonitoringStopped);
        drop(bus);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
