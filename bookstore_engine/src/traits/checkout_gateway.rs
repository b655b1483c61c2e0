use thiserror::Error;

use crate::{
    db_types::{GatewaySessionId, Order},
    order_objects::PricedItem,
};

#[derive(Debug, Clone, Error)]
#[error("The payment gateway could not create a checkout session. {0}")]
pub struct CheckoutGatewayError(pub String);

/// The outbound seam to the payment gateway.
///
/// The engine only asks the gateway for one thing: a hosted checkout session for a freshly
/// created order. The session carries one line per order item at its frozen unit price plus a
/// shipping line, with the order number attached as correlation metadata. Webhook traffic flows
/// the other way and never passes through this trait.
#[allow(async_fn_in_trait)]
pub trait CheckoutGateway: Clone {
    async fn create_checkout_session(
        &self,
        order: &Order,
        items: &[PricedItem],
    ) -> Result<GatewaySessionId, CheckoutGatewayError>;
}
