use std::fmt::Display;

use bookstore_engine::{
    db_types::{Order, ShippingAddress},
    order_objects::{CompletedCheckout, PricedItem},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderParams {
    pub customer_id: String,
    #[serde(default)]
    pub coupon_code: Option<String>,
    pub shipping: ShippingAddress,
}

/// Body of `POST /api/cart/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItemParams {
    pub customer_id: String,
    pub book_id: i64,
    pub quantity: i64,
}

/// Body of `POST /api/books`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBookParams {
    pub title: String,
    #[serde(default)]
    pub author: Option<String>,
    /// Price in cents.
    pub price: i64,
    pub stock_quantity: i64,
}

/// Body of `POST /api/coupons`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCouponParams {
    pub code: String,
    #[serde(default)]
    pub percent_off: Option<i64>,
    /// Fixed discount in cents. Exactly one of `percent_off` / `amount_off` must be given.
    #[serde(default)]
    pub amount_off: Option<i64>,
}

/// Response of `POST /api/orders`: the order plus the hosted checkout the customer must be sent
/// to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    pub items: Vec<PricedItem>,
    pub gateway_session_id: String,
}

impl From<CompletedCheckout> for CheckoutResult {
    fn from(checkout: CompletedCheckout) -> Self {
        let gateway_session_id =
            checkout.order.gateway_session_id.as_ref().map(|s| s.to_string()).unwrap_or_default();
        Self { order: checkout.order, items: checkout.items, gateway_session_id }
    }
}
