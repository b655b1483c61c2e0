use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
};

use crate::{
    config::StripeConfig,
    data_objects::{CheckoutSession, CheckoutSessionRequest},
    GatewayError,
};

#[derive(Clone)]
pub struct StripeApi {
    config: StripeConfig,
    client: Arc<Client>,
}

impl StripeApi {
    pub fn new(config: StripeConfig) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::with_capacity(1);
        let bearer = format!("Bearer {}", config.secret_key.reveal());
        let mut val = HeaderValue::from_str(&bearer).map_err(|e| GatewayError::Initialization(e.to_string()))?;
        val.set_sensitive(true);
        headers.insert("Authorization", val);
        let client =
            Client::builder().default_headers(headers).build().map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// Creates a hosted checkout session for the given order.
    ///
    /// One line item is sent per order item, at the frozen unit price captured on the order, plus
    /// one line for shipping. The order number travels on the session as `client_reference_id` so
    /// that webhook deliveries can always be correlated back to the order.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, GatewayError> {
        let params = session_form_params(request, &self.config.success_url, &self.config.cancel_url);
        let url = format!("{}/v1/checkout/sessions", self.config.api_url);
        trace!("Creating checkout session for order {}", request.order_number);
        let response = self
            .client
            .post(url)
            .form(&params)
            .send()
            .await
            .map_err(|e| GatewayError::RestResponseError(e.to_string()))?;
        if response.status().is_success() {
            let session = response.json::<CheckoutSession>().await.map_err(|e| GatewayError::JsonError(e.to_string()))?;
            debug!("Checkout session {} created for order {}", session.id, request.order_number);
            Ok(session)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayError::RestResponseError(e.to_string()))?;
            Err(GatewayError::QueryError { status, message })
        }
    }
}

/// The gateway takes a flattened, bracket-keyed form body rather than JSON.
fn session_form_params(
    request: &CheckoutSessionRequest,
    success_url: &str,
    cancel_url: &str,
) -> Vec<(String, String)> {
    let mut params = vec![
        ("mode".to_string(), "payment".to_string()),
        ("client_reference_id".to_string(), request.order_number.clone()),
        ("success_url".to_string(), success_url.to_string()),
        ("cancel_url".to_string(), cancel_url.to_string()),
    ];
    let currency = request.currency.to_lowercase();
    let mut push_line = |i: usize, name: &str, unit_amount: i64, quantity: u32| {
        params.push((format!("line_items[{i}][price_data][currency]"), currency.clone()));
        params.push((format!("line_items[{i}][price_data][product_data][name]"), name.to_string()));
        params.push((format!("line_items[{i}][price_data][unit_amount]"), unit_amount.to_string()));
        params.push((format!("line_items[{i}][quantity]"), quantity.to_string()));
    };
    for (i, item) in request.line_items.iter().enumerate() {
        push_line(i, &item.name, item.unit_amount.value(), item.quantity);
    }
    if request.shipping.value() > 0 {
        push_line(request.line_items.len(), "Shipping", request.shipping.value(), 1);
    }
    params
}
