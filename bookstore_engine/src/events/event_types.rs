use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

//--------------------------------------  Order lifecycle    ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Emitted when an order leaves `PendingPayment` without being paid (cancelled, expired, or the
/// payment failed). Stock has already been released when this fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status;
        Self { order, status }
    }
}

/// The envelope fanned out over the topic broadcaster to real-time listeners (e.g. the admin
/// order stream).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderLifecycleEvent {
    Created(OrderCreatedEvent),
    Paid(OrderPaidEvent),
    Annulled(OrderAnnulledEvent),
}

impl OrderLifecycleEvent {
    pub fn order(&self) -> &Order {
        match self {
            OrderLifecycleEvent::Created(ev) => &ev.order,
            OrderLifecycleEvent::Paid(ev) => &ev.order,
            OrderLifecycleEvent::Annulled(ev) => &ev.order,
        }
    }
}

//--------------------------------------      Catalog        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogChange {
    Created,
    Updated,
    SoftDeleted,
    Restored,
}

/// Fired after a catalog entity changes, so the search index can be refreshed. Delivery is
/// best-effort and happens outside any transaction; the index may lag but never blocks a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogChangedEvent {
    /// The entity's table name, e.g. "books".
    pub entity: String,
    pub entity_id: i64,
    pub change: CatalogChange,
}

impl CatalogChangedEvent {
    pub fn new<S: Into<String>>(entity: S, entity_id: i64, change: CatalogChange) -> Self {
        Self { entity: entity.into(), entity_id, change }
    }
}
