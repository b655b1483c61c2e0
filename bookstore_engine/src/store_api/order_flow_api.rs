use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{
        Order,
        OrderNumber,
        OrderStatusType::{Cancelled, Fulfilled, Paid, PaymentFailed, PendingPayment},
        ReservationToken,
    },
    events::{
        EventBroadcaster,
        EventProducers,
        OrderAnnulledEvent,
        OrderCreatedEvent,
        OrderLifecycleEvent,
        OrderPaidEvent,
        ADMIN_ORDER_TOPIC,
    },
    order_objects::{Ack, CheckoutRequest, CompletedCheckout, GatewayEvent, IgnoredReason},
    traits::{CheckoutGateway, StorefrontDatabase, StorefrontError},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: converting carts into orders,
/// reconciling payment-gateway webhook events against the order state machine, and the
/// merchant-side cancel and fulfil actions.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    broadcaster: EventBroadcaster,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers, broadcaster: EventBroadcaster) -> Self {
        Self { db, gateway, producers, broadcaster }
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.broadcaster
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: StorefrontDatabase,
    G: CheckoutGateway,
{
    /// Converts the customer's cart into a `PendingPayment` order and opens a hosted checkout
    /// session for it.
    ///
    /// Stock is reserved atomically with order creation. If the gateway then refuses to open a
    /// session, the reservation and the order are rolled back again with a compensating action,
    /// leaving the cart untouched, and the caller sees a `Gateway` error. On success the cart is
    /// drained and an [`OrderCreatedEvent`] is emitted.
    pub async fn checkout(&self, request: CheckoutRequest) -> Result<CompletedCheckout, StorefrontError> {
        let coupon = match request.coupon_code.as_deref() {
            Some(code) => {
                let coupon = self
                    .db
                    .fetch_coupon_by_code(code)
                    .await?
                    .ok_or_else(|| StorefrontError::InvalidCoupon(code.to_string()))?;
                if !coupon.active {
                    return Err(StorefrontError::InvalidCoupon(code.to_string()));
                }
                Some(coupon)
            },
            None => None,
        };
        let pricing = self.db.load_pricing().await?;
        let draft = self.db.checkout_cart(&request.customer_id, &request.shipping, coupon.as_ref(), &pricing).await?;
        let session_id = match self.gateway.create_checkout_session(&draft.order, &draft.items).await {
            Ok(id) => id,
            Err(e) => {
                warn!("🔄️💳️ Gateway refused a session for order [{}]: {e}. Rolling back.", draft.order.order_number);
                if let Err(rollback) = self.db.abandon_checkout(draft.order.id).await {
                    error!(
                        "🔄️💳️ Compensating rollback for order [{}] failed: {rollback}. Stock for this order is \
                         still reserved and needs manual correction.",
                        draft.order.order_number
                    );
                }
                return Err(StorefrontError::Gateway(e.to_string()));
            },
        };
        let order = self.db.attach_gateway_session(draft.order.id, &session_id).await?;
        self.call_order_created_hook(&order).await;
        self.broadcast(OrderLifecycleEvent::Created(OrderCreatedEvent::new(order.clone())));
        debug!("🔄️📦️ Checkout complete for order [{}]. Session: {session_id}", order.order_number);
        Ok(CompletedCheckout { order, items: draft.items })
    }

    /// Reconciles one gateway webhook event against the order state machine.
    ///
    /// Every outcome other than a database failure is an acknowledgement: duplicates, replays,
    /// out-of-order deliveries, unknown sessions and unmapped event types all come back as
    /// [`Ack::Ignored`] so the web layer can tell the gateway to stop retrying.
    pub async fn process_gateway_event(&self, event: GatewayEvent) -> Result<Ack, StorefrontError> {
        let (session_id, target) = match &event {
            GatewayEvent::CheckoutCompleted(id) => (id.clone(), Paid),
            GatewayEvent::CheckoutExpired(id) => (id.clone(), Cancelled),
            GatewayEvent::PaymentFailed(id) => (id.clone(), PaymentFailed),
            GatewayEvent::Unhandled { .. } => {
                debug!("🔄️💳️ Ignoring webhook event type '{}'", event.name());
                return Ok(Ack::Ignored(IgnoredReason::UnhandledEventType(event.name().to_string())));
            },
        };
        let order = match self.db.fetch_order_by_session(&session_id).await? {
            Some(order) => order,
            None => {
                info!("🔄️💳️ Webhook event '{}' references unknown session {session_id}", event.name());
                return Ok(Ack::Ignored(IgnoredReason::UnknownSession(session_id)));
            },
        };
        match self.db.transition_order(order.id, PendingPayment, target).await? {
            Some(updated) => {
                if target == Paid {
                    self.call_order_paid_hook(&updated).await;
                    self.broadcast(OrderLifecycleEvent::Paid(OrderPaidEvent::new(updated.clone())));
                } else {
                    self.annul(&updated).await?;
                }
                info!("🔄️📦️ Order [{}] moved to {target} on '{}'", updated.order_number, event.name());
                Ok(Ack::Applied(updated))
            },
            None => {
                debug!(
                    "🔄️📦️ Event '{}' for order [{}] had no effect. Current status: {}",
                    event.name(),
                    order.order_number,
                    order.status
                );
                Ok(Ack::Ignored(IgnoredReason::NoLegalTransition { current: order.status }))
            },
        }
    }

    /// Cancels a `PendingPayment` order on behalf of the merchant or customer, releasing its
    /// stock reservation.
    pub async fn cancel_order(&self, order_number: &OrderNumber) -> Result<Order, StorefrontError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| StorefrontError::OrderNotFound(order_number.clone()))?;
        match self.db.transition_order(order.id, PendingPayment, Cancelled).await? {
            Some(updated) => {
                self.annul(&updated).await?;
                info!("🔄️📦️ Order [{}] cancelled", updated.order_number);
                Ok(updated)
            },
            None => Err(StorefrontError::IllegalTransition {
                order: order.order_number,
                from: order.status,
                event: "cancel".to_string(),
            }),
        }
    }

    /// Marks a `Paid` order as shipped. Terminal; no further transitions are accepted.
    pub async fn mark_fulfilled(&self, order_number: &OrderNumber) -> Result<Order, StorefrontError> {
        let order = self
            .db
            .fetch_order_by_number(order_number)
            .await?
            .ok_or_else(|| StorefrontError::OrderNotFound(order_number.clone()))?;
        match self.db.transition_order(order.id, Paid, Fulfilled).await? {
            Some(updated) => {
                info!("🔄️📦️ Order [{}] fulfilled", updated.order_number);
                Ok(updated)
            },
            None => Err(StorefrontError::IllegalTransition {
                order: order.order_number,
                from: order.status,
                event: "fulfil".to_string(),
            }),
        }
    }

    pub async fn fetch_order(&self, order_number: &OrderNumber) -> Result<Option<Order>, StorefrontError> {
        self.db.fetch_order_by_number(order_number).await
    }

    /// Releases the order's reservation and emits the annulment event. The release is idempotent,
    /// so a cancel racing an expiry restores stock exactly once.
    async fn annul(&self, order: &Order) -> Result<(), StorefrontError> {
        let token = ReservationToken::for_order(order);
        if self.db.release_reservation(&token).await? {
            debug!("🔄️📚️ Stock released for annulled order [{}]", order.order_number);
        }
        self.call_order_annulled_hook(order).await;
        self.broadcast(OrderLifecycleEvent::Annulled(OrderAnnulledEvent::new(order.clone())));
        Ok(())
    }

    async fn call_order_created_hook(&self, order: &Order) {
        for emitter in &self.producers.order_created_producer {
            trace!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone())).await;
        }
    }

    async fn call_order_paid_hook(&self, order: &Order) {
        for emitter in &self.producers.order_paid_producer {
            trace!("🔄️💰️ Notifying order paid hook subscribers");
            emitter.publish_event(OrderPaidEvent::new(order.clone())).await;
        }
    }

    async fn call_order_annulled_hook(&self, order: &Order) {
        for emitter in &self.producers.order_annulled_producer {
            trace!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }

    fn broadcast(&self, event: OrderLifecycleEvent) {
        self.broadcaster.publish(ADMIN_ORDER_TOPIC, event);
    }
}
