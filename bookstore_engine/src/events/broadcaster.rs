//! Topic-scoped fan-out to real-time listeners.
//!
//! Unlike the hook channels, which drive engine-internal follow-ups, the broadcaster serves
//! outward-facing subscribers such as the admin order dashboard. Delivery is best-effort: a
//! subscriber that is not connected at publish time simply misses the event, and a lagging
//! subscriber drops the oldest events. Per-topic publish order is preserved by the underlying
//! channel.
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use log::*;
use tokio::sync::broadcast;

use crate::events::OrderLifecycleEvent;

pub const ADMIN_ORDER_TOPIC: &str = "admin.orders";

const DEFAULT_TOPIC_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct EventBroadcaster {
    topics: Arc<RwLock<HashMap<String, broadcast::Sender<OrderLifecycleEvent>>>>,
    capacity: usize,
}

impl Default for EventBroadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_CAPACITY)
    }
}

impl EventBroadcaster {
    pub fn new(capacity: usize) -> Self {
        Self { topics: Arc::new(RwLock::new(HashMap::new())), capacity }
    }

    /// Subscribes to a topic, creating it if needed. Events published before this call are not
    /// replayed.
    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<OrderLifecycleEvent> {
        let mut topics = self.topics.write().unwrap_or_else(|p| p.into_inner());
        topics.entry(topic.to_string()).or_insert_with(|| broadcast::channel(self.capacity).0).subscribe()
    }

    /// Publishes an event to every current subscriber of the topic. A topic nobody has
    /// subscribed to swallows the event silently.
    pub fn publish(&self, topic: &str, event: OrderLifecycleEvent) {
        let topics = self.topics.read().unwrap_or_else(|p| p.into_inner());
        if let Some(sender) = topics.get(topic) {
            match sender.send(event) {
                Ok(n) => trace!("📡️ Published event on '{topic}' to {n} subscribers"),
                Err(_) => trace!("📡️ No subscribers left on '{topic}', event dropped"),
            }
        } else {
            trace!("📡️ No such topic '{topic}', event dropped");
        }
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        let topics = self.topics.read().unwrap_or_else(|p| p.into_inner());
        topics.get(topic).map(|s| s.receiver_count()).unwrap_or(0)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::events::OrderCreatedEvent;

    fn dummy_event(n: i64) -> OrderLifecycleEvent {
        use bps_common::Money;
        use chrono::Utc;

        use crate::db_types::{Order, OrderNumber, OrderStatusType};
        OrderLifecycleEvent::Created(OrderCreatedEvent::new(Order {
            id: n,
            order_number: OrderNumber(format!("BK-TEST-{n}")),
            customer_id: "cust-1".to_string(),
            status: OrderStatusType::PendingPayment,
            subtotal: Money::from_cents(1000),
            discount_amount: Money::ZERO,
            tax_amount: Money::from_cents(100),
            shipping_cost: Money::from_cents(500),
            total_amount: Money::from_cents(1600),
            coupon_id: None,
            gateway_session_id: None,
            ship_name: "A Customer".to_string(),
            ship_line1: "1 High St".to_string(),
            ship_line2: None,
            ship_city: "Springfield".to_string(),
            ship_postcode: "12345".to_string(),
            ship_country: "US".to_string(),
            stock_released: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }))
    }

    #[tokio::test]
    async fn per_topic_publish_order_is_preserved() {
        let broadcaster = EventBroadcaster::default();
        let mut rx = broadcaster.subscribe(ADMIN_ORDER_TOPIC);
        for i in 0..5 {
            broadcaster.publish(ADMIN_ORDER_TOPIC, dummy_event(i));
        }
        for i in 0..5 {
            let ev = rx.recv().await.unwrap();
            assert_eq!(ev.order().id, i);
        }
    }

    #[tokio::test]
    async fn absent_subscribers_miss_events_without_error() {
        let broadcaster = EventBroadcaster::default();
        // Nobody is listening; publish must not fail.
        broadcaster.publish(ADMIN_ORDER_TOPIC, dummy_event(1));
        // A subscriber arriving later sees nothing from the past.
        let mut rx = broadcaster.subscribe(ADMIN_ORDER_TOPIC);
        broadcaster.publish(ADMIN_ORDER_TOPIC, dummy_event(2));
        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.order().id, 2);
    }

    #[tokio::test]
    async fn topics_are_isolated() {
        let broadcaster = EventBroadcaster::default();
        let mut admin = broadcaster.subscribe("admin.orders");
        let _other = broadcaster.subscribe("other.topic");
        broadcaster.publish("other.topic", dummy_event(7));
        broadcaster.publish("admin.orders", dummy_event(8));
        assert_eq!(admin.recv().await.unwrap().order().id, 8);
        assert_eq!(broadcaster.subscriber_count("admin.orders"), 1);
    }
}
