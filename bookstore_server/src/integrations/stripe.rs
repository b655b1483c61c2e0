//! Glue between the engine's gateway seam and the hosted-checkout client.
//!
//! [`StripeGateway`] adapts [`StripeApi`] to the engine's
//! [`CheckoutGateway`](bookstore_engine::traits::CheckoutGateway) trait, and
//! [`to_gateway_event`] translates verified webhook payloads into the engine's event terms.
use bookstore_engine::{
    db_types::{GatewaySessionId, Order},
    order_objects::{GatewayEvent, PricedItem},
    traits::{CheckoutGateway, CheckoutGatewayError},
};
use bps_common::DEFAULT_CURRENCY_CODE;
use log::*;
use stripe_tools::{CheckoutLineItem, CheckoutSessionRequest, StripeApi, StripeConfig, WebhookEvent};

#[derive(Clone)]
pub struct StripeGateway {
    api: StripeApi,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> Result<Self, CheckoutGatewayError> {
        let api = StripeApi::new(config).map_err(|e| CheckoutGatewayError(e.to_string()))?;
        Ok(Self { api })
    }
}

impl CheckoutGateway for StripeGateway {
    async fn create_checkout_session(
        &self,
        order: &Order,
        items: &[PricedItem],
    ) -> Result<GatewaySessionId, CheckoutGatewayError> {
        let line_items = items
            .iter()
            .map(|item| {
                let quantity = u32::try_from(item.quantity)
                    .map_err(|_| CheckoutGatewayError(format!("Line quantity {} is out of range", item.quantity)))?;
                Ok(CheckoutLineItem::new(item.title.clone(), item.unit_price, quantity))
            })
            .collect::<Result<Vec<_>, CheckoutGatewayError>>()?;
        let request = CheckoutSessionRequest {
            order_number: order.order_number.to_string(),
            currency: DEFAULT_CURRENCY_CODE.to_string(),
            line_items,
            shipping: order.shipping_cost,
        };
        let session =
            self.api.create_checkout_session(&request).await.map_err(|e| CheckoutGatewayError(e.to_string()))?;
        debug!("💳️ Gateway session {} opened for order [{}]", session.id, order.order_number);
        Ok(GatewaySessionId::from(session.id.0))
    }
}

/// Translates a verified webhook payload into the engine's event vocabulary.
pub fn to_gateway_event(event: WebhookEvent) -> GatewayEvent {
    match event {
        WebhookEvent::CheckoutCompleted { session_id } => {
            GatewayEvent::CheckoutCompleted(GatewaySessionId::from(session_id.0))
        },
        WebhookEvent::CheckoutExpired { session_id } => {
            GatewayEvent::CheckoutExpired(GatewaySessionId::from(session_id.0))
        },
        WebhookEvent::PaymentFailed { session_id } => {
            GatewayEvent::PaymentFailed(GatewaySessionId::from(session_id.0))
        },
        WebhookEvent::Other { event_type } => GatewayEvent::Unhandled { event_type },
    }
}
