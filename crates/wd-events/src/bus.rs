use crate::types::EventRecord;
use tokio::sync::broadcast;

pub const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out channel for committed events. Subscribers that lag are allowed to
/// miss records; the durable log is the events table, not this bus.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EventRecord>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }

    /// Send fails only when nobody is subscribed; callers treat that as
    /// fine and drop the error.
    pub fn publish(
        &self,
        event: EventRecord,
    ) -> Result<(), broadcast::error::SendError<EventRecord>> {
        self.sender.send(event).map(|_| ())
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;
    use crate::types::{EventRecord, EventSource};
    use chrono::Utc;

    fn record(seq: i64) -> EventRecord {
        EventRecord {
            id: format!("evt_{seq:026}"),
            seq,
            at: Utc::now(),
            correlation_id: None,
            source: EventSource::System,
            body: serde_json::json!({ "type": "Test" }),
        }
    }

    #[test]
    fn publish_without_subscribers_is_an_error_not_a_panic() {
        let bus = EventBus::new(4);
        assert!(bus.publish(record(1)).is_err());
    }

    #[test]
    fn subscribers_see_records_in_order() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        bus.publish(record(1)).unwrap();
        bus.publish(record(2)).unwrap();
        assert_eq!(rx.try_recv().unwrap().seq, 1);
        assert_eq!(rx.try_recv().unwrap().seq, 2);
    }
}
