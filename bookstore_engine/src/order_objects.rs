use serde::{Deserialize, Serialize};

use bps_common::Money;

use crate::db_types::{GatewaySessionId, Order, OrderStatusType, ShippingAddress};

//--------------------------------------  CheckoutRequest    ---------------------------------------------------------
/// The inbound order-creation request, as handed over by the web layer. The customer id has
/// already been authenticated upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub customer_id: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub shipping: ShippingAddress,
}

//--------------------------------------    PricedItem       ---------------------------------------------------------
/// An order line as priced during checkout, before it is persisted as an `OrderItem`. Carries the
/// book title so the gateway can label its line items without another catalog round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricedItem {
    pub book_id: i64,
    pub title: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

//--------------------------------------   CheckoutDraft     ---------------------------------------------------------
/// A freshly persisted order with its priced items, awaiting a gateway session. Produced by
/// [`StorefrontDatabase::checkout_cart`](crate::traits::StorefrontDatabase::checkout_cart).
#[derive(Debug, Clone)]
pub struct CheckoutDraft {
    pub order: Order,
    pub items: Vec<PricedItem>,
}

//-------------------------------------- CompletedCheckout   ---------------------------------------------------------
/// The result of a successful checkout: the persisted order (now carrying its gateway session id)
/// and the priced items it was built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedCheckout {
    pub order: Order,
    pub items: Vec<PricedItem>,
}

//--------------------------------------   GatewayEvent      ---------------------------------------------------------
/// A payment-gateway webhook event, translated into the engine's terms. The set is closed; event
/// types the system does not consume arrive as `Unhandled` and are acknowledged without effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// The customer completed the hosted checkout; payment received in full.
    CheckoutCompleted(GatewaySessionId),
    /// The checkout session expired before payment.
    CheckoutExpired(GatewaySessionId),
    /// The gateway reported a failed payment for the session.
    PaymentFailed(GatewaySessionId),
    /// An event type this system does not act on.
    Unhandled { event_type: String },
}

impl GatewayEvent {
    pub fn session_id(&self) -> Option<&GatewaySessionId> {
        match self {
            GatewayEvent::CheckoutCompleted(id)
            | GatewayEvent::CheckoutExpired(id)
            | GatewayEvent::PaymentFailed(id) => Some(id),
            GatewayEvent::Unhandled { .. } => None,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            GatewayEvent::CheckoutCompleted(_) => "checkout completed",
            GatewayEvent::CheckoutExpired(_) => "checkout expired",
            GatewayEvent::PaymentFailed(_) => "payment failed",
            GatewayEvent::Unhandled { event_type } => event_type,
        }
    }
}

//--------------------------------------        Ack          ---------------------------------------------------------
/// The outcome of processing a webhook event. Both variants are acknowledged to the gateway with
/// a success response; `Ignored` is deliberate absorption (duplicates, unknown sessions,
/// unmapped event types), never a failure the gateway should retry.
#[derive(Debug, Clone)]
pub enum Ack {
    /// The event caused a state transition on this order.
    Applied(Order),
    /// The event was acknowledged but intentionally had no effect.
    Ignored(IgnoredReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoredReason {
    /// No order carries the session id the event referred to.
    UnknownSession(GatewaySessionId),
    /// The order's current status does not accept this event (duplicate or out-of-order
    /// delivery; the conditional update found zero rows).
    NoLegalTransition { current: OrderStatusType },
    /// An event type the system does not consume.
    UnhandledEventType(String),
}
