use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::entities::OrderStatus;

/// Change notifications published by the services after a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // Catalog events
    ProductCreated(i32),
    ProductUpdated(i32),
    ProductDeleted(i32),

    // Customer events
    CustomerCreated(i32),
    CustomerUpdated(i32),
    CustomerDeleted(i32),

    // Order events
    OrderCreated(i32),
    OrderStatusChanged {
        order_id: i32,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },

    // Inventory events
    InventoryRestocked {
        inventory_id: i32,
        quantity_added: i32,
        restocked_on: NaiveDate,
    },
    LowStockReplenished {
        rows: u64,
    },

    DataSeeded,
}

impl Event {
    /// Whether the dashboard figures may be stale after this event.
    ///
    /// Customer renames show up in the recent orders list, so updates count.
    pub fn affects_dashboard(&self) -> bool {
        match self {
            Event::LowStockReplenished { rows } => *rows > 0,
            _ => true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Creates a sender together with the receiving end of a bounded channel.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self::new(tx), rx)
    }

    /// Publishes without waiting. A full or closed channel is logged and
    /// otherwise ignored; the write that produced the event already succeeded.
    pub fn send_or_log(&self, event: Event) {
        debug!(?event, "publishing event");
        if let Err(e) = self.sender.try_send(event) {
            warn!("Failed to publish event: {}", e);
        }
    }
}

/// Takes every event currently queued without waiting for more.
pub fn drain(rx: &mut mpsc::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_replenish_leaves_the_dashboard_alone() {
        assert!(Event::ProductCreated(1).affects_dashboard());
        assert!(Event::CustomerUpdated(2).affects_dashboard());
        assert!(Event::OrderCreated(3).affects_dashboard());
        assert!(!Event::LowStockReplenished { rows: 0 }.affects_dashboard());
        assert!(Event::LowStockReplenished { rows: 2 }.affects_dashboard());
    }

    #[tokio::test]
    async fn full_channel_does_not_block_the_sender() {
        let (sender, mut rx) = EventSender::channel(1);
        sender.send_or_log(Event::OrderCreated(1));
        sender.send_or_log(Event::OrderCreated(2));

        assert_eq!(drain(&mut rx), vec![Event::OrderCreated(1)]);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn closed_channel_is_ignored() {
        let (sender, rx) = EventSender::channel(4);
        drop(rx);
        sender.send_or_log(Event::DataSeeded);
    }
}
