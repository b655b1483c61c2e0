//----------------------------------------------   Webhooks  ----------------------------------------------------
use actix_web::{web, HttpRequest, HttpResponse};
use bookstore_engine::{
    order_objects::{Ack, IgnoredReason},
    traits::{CheckoutGateway, StorefrontDatabase},
    OrderFlowApi,
};
use log::*;
use stripe_tools::WebhookEvent;

use crate::{data_objects::JsonResponse, integrations::stripe::to_gateway_event};

/// `POST /webhook/payment_gateway`.
///
/// The signature middleware has already verified the payload before this handler runs. From here
/// on, every outcome short of a server fault is acknowledged with a 200 so the gateway stops
/// retrying: duplicates, out-of-order deliveries, unknown sessions and unmapped event types are
/// all absorbed deliberately.
pub async fn gateway_webhook<B, G>(
    req: HttpRequest,
    body: web::Bytes,
    api: web::Data<OrderFlowApi<B, G>>,
) -> HttpResponse
where
    B: StorefrontDatabase + 'static,
    G: CheckoutGateway + 'static,
{
    trace!("💳️ Received gateway webhook request: {}", req.uri());
    let event = match WebhookEvent::from_payload(&body) {
        Ok(event) => event,
        Err(e) => {
            // A verified payload we cannot parse is not worth a retry storm either
            warn!("💳️ Could not parse webhook payload. {e}");
            return HttpResponse::Ok().json(JsonResponse::failure("Unparseable payload"));
        },
    };
    let result = match api.process_gateway_event(to_gateway_event(event)).await {
        Ok(Ack::Applied(order)) => {
            info!("💳️ Webhook applied. Order [{}] is now {}", order.order_number, order.status);
            JsonResponse::success(format!("Order {} updated", order.order_number))
        },
        Ok(Ack::Ignored(reason)) => {
            let message = match reason {
                IgnoredReason::UnknownSession(id) => format!("No order for session {id}"),
                IgnoredReason::NoLegalTransition { current } => {
                    format!("Event does not apply to an order in status {current}")
                },
                IgnoredReason::UnhandledEventType(event_type) => format!("Event type {event_type} is not consumed"),
            };
            debug!("💳️ Webhook absorbed without effect. {message}");
            JsonResponse::success(message)
        },
        Err(e) => {
            error!("💳️ Error processing webhook event. {e}");
            return HttpResponse::InternalServerError().json(JsonResponse::failure("Error processing event"));
        },
    };
    HttpResponse::Ok().json(result)
}
