use std::{fmt::Display, str::FromStr};

use bps_common::Money;
use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------    OrderNumber      ---------------------------------------------------------
/// The human-displayable order identifier. Generated once at order creation and immutable after
/// that; never recycled.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderNumber(pub String);

impl FromStr for OrderNumber {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderNumber {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  GatewaySessionId   ---------------------------------------------------------
/// The payment gateway's identifier for the hosted checkout session attached to an order. Unique
/// across all orders when present; webhook events are resolved through it.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct GatewaySessionId(pub String);

impl Display for GatewaySessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GatewaySessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GatewaySessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl GatewaySessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------  OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// The order has been created and a checkout session exists, but no payment has been made.
    PendingPayment,
    /// The gateway confirmed payment in full.
    Paid,
    /// The order was paid and has been handed to fulfilment. Terminal.
    Fulfilled,
    /// The gateway reported a failed payment. Terminal; stock has been released.
    PaymentFailed,
    /// The order was cancelled, either explicitly or because the checkout session expired.
    /// Terminal; stock has been released.
    Cancelled,
}

impl OrderStatusType {
    /// Whether the payment lifecycle can still move on from this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::PendingPayment | OrderStatusType::Paid)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::PendingPayment => write!(f, "PendingPayment"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Fulfilled => write!(f, "Fulfilled"),
            OrderStatusType::PaymentFailed => write!(f, "PaymentFailed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to PendingPayment");
            OrderStatusType::PendingPayment
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PendingPayment" => Ok(Self::PendingPayment),
            "Paid" => Ok(Self::Paid),
            "Fulfilled" => Ok(Self::Fulfilled),
            "PaymentFailed" => Ok(Self::PaymentFailed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------  ShippingAddress    ---------------------------------------------------------
/// A shipping address as captured at order creation. Stored on the order as a snapshot of
/// columns, so later edits to the customer's address book never touch existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub name: String,
    pub line1: String,
    pub line2: Option<String>,
    pub city: String,
    pub postcode: String,
    pub country: String,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_id: String,
    pub status: OrderStatusType,
    pub subtotal: Money,
    pub discount_amount: Money,
    pub tax_amount: Money,
    pub shipping_cost: Money,
    pub total_amount: Money,
    pub coupon_id: Option<i64>,
    pub gateway_session_id: Option<GatewaySessionId>,
    pub ship_name: String,
    pub ship_line1: String,
    pub ship_line2: Option<String>,
    pub ship_city: String,
    pub ship_postcode: String,
    pub ship_country: String,
    /// Set once the stock reserved for this order has been restored. Guards release idempotence.
    pub stock_released: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// `total_amount == subtotal - discount_amount + tax_amount + shipping_cost` must hold at
    /// every persisted state.
    pub fn totals_are_consistent(&self) -> bool {
        self.total_amount == self.subtotal - self.discount_amount + self.tax_amount + self.shipping_cost
    }

    pub fn shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            name: self.ship_name.clone(),
            line1: self.ship_line1.clone(),
            line2: self.ship_line2.clone(),
            city: self.ship_city.clone(),
            postcode: self.ship_postcode.clone(),
            country: self.ship_country.clone(),
        }
    }
}

//--------------------------------------     OrderItem       ---------------------------------------------------------
/// One line of an order. `unit_price` and `total_price` are frozen at order-creation time and
/// never change, no matter what happens to the catalog price afterwards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub book_id: i64,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
}

//--------------------------------------  ReservationToken   ---------------------------------------------------------
/// Opaque handle for the stock reserved by an order. Releasing through the token is idempotent:
/// the order row's `stock_released` flag decides whether stock is actually restored, not the
/// number of times the caller presents the token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationToken(i64);

impl ReservationToken {
    pub fn for_order(order: &Order) -> Self {
        Self(order.id)
    }

    pub fn order_id(&self) -> i64 {
        self.0
    }
}

//--------------------------------------        Book         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: Option<String>,
    pub price: Money,
    pub stock_quantity: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub price: Money,
    pub stock_quantity: i64,
}

impl NewBook {
    pub fn new<S: Into<String>>(title: S, price: Money, stock_quantity: i64) -> Self {
        Self { title: title.into(), author: None, price, stock_quantity }
    }

    pub fn by<S: Into<String>>(mut self, author: S) -> Self {
        self.author = Some(author.into());
        self
    }
}

//--------------------------------------     CoverImage      ---------------------------------------------------------
/// An attachment row linking a book to its cover art blob. Soft-deleted alongside the book so the
/// pair can be restored together.
#[derive(Debug, Clone, FromRow)]
pub struct CoverImage {
    pub id: i64,
    pub book_id: i64,
    pub blob_id: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------        Blob         ---------------------------------------------------------
/// Physical binary storage. Blobs are shared and deduplicated, so a blob is only tombstoned when
/// no live attachment references it any more.
#[derive(Debug, Clone, FromRow)]
pub struct Blob {
    pub id: i64,
    pub storage_key: String,
    pub byte_size: i64,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       Coupon        ---------------------------------------------------------
/// A discount coupon. Exactly one of `percent_off` / `amount_off` is set; a coupon with both or
/// neither is a configuration error and is reported as such, never silently resolved.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Coupon {
    pub id: i64,
    pub code: String,
    pub percent_off: Option<i64>,
    pub amount_off: Option<Money>,
    pub active: bool,
    pub gateway_coupon_id: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCoupon {
    pub code: String,
    pub percent_off: Option<i64>,
    pub amount_off: Option<Money>,
    pub active: bool,
}

impl NewCoupon {
    pub fn percent<S: Into<String>>(code: S, percent_off: i64) -> Self {
        Self { code: code.into(), percent_off: Some(percent_off), amount_off: None, active: true }
    }

    pub fn fixed<S: Into<String>>(code: S, amount_off: Money) -> Self {
        Self { code: code.into(), percent_off: None, amount_off: Some(amount_off), active: true }
    }
}

//--------------------------------------      CartLine       ---------------------------------------------------------
/// A line of the customer's (ephemeral) cart. The cart is drained when it is converted into an
/// order and is not retained afterwards.
#[derive(Debug, Clone, FromRow)]
pub struct CartLine {
    pub book_id: i64,
    pub quantity: i64,
}
