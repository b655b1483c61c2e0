use std::fmt::Display;

use bps_common::Money;
use serde::{Deserialize, Serialize};

//--------------------------------------      SessionId      ---------------------------------------------------------
/// The gateway's identifier for a hosted checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------   CheckoutLineItem  ---------------------------------------------------------
/// One line of a checkout session. Prices are the frozen per-unit amounts from the order, not
/// live catalog prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutLineItem {
    pub name: String,
    pub unit_amount: Money,
    pub quantity: u32,
}

impl CheckoutLineItem {
    pub fn new<S: Into<String>>(name: S, unit_amount: Money, quantity: u32) -> Self {
        Self { name: name.into(), unit_amount, quantity }
    }
}

//------------------------------------ CheckoutSessionRequest -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    /// The merchant's order number, attached to the session as correlation metadata.
    pub order_number: String,
    pub currency: String,
    pub line_items: Vec<CheckoutLineItem>,
    /// Shipping, charged as its own line on the session.
    pub shipping: Money,
}

//--------------------------------------   CheckoutSession   ---------------------------------------------------------
/// The subset of the gateway's session object that we care about.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: SessionId,
    /// The hosted payment page the customer must be redirected to.
    pub url: String,
    #[serde(default)]
    pub client_reference_id: Option<String>,
}
