//! # Storefront backend contracts.
//!
//! This module defines the interface contracts the engine is written against.
//!
//! * [`StorefrontDatabase`] is the behaviour a storage backend must expose: the inventory ledger
//!   (atomic reserve/release of stock), order persistence and conditional status transitions,
//!   cart draining, coupon lookup, and the generic tombstone operations.
//! * [`CheckoutGateway`] is the seam to the external payment gateway. The engine only ever asks
//!   it to create a hosted checkout session; everything inbound arrives as a
//!   [`GatewayEvent`](crate::order_objects::GatewayEvent) through the server layer.
//! * [`Tombstonable`] is the capability an entity type implements to take part in
//!   soft-delete/restore/purge. Each type explicitly declares its attachment relations; there is
//!   no reflection over fields.
mod checkout_gateway;
mod storefront_database;
mod tombstone;

pub use checkout_gateway::{CheckoutGateway, CheckoutGatewayError};
pub use storefront_database::{StorefrontDatabase, StorefrontError};
pub use tombstone::{AttachmentRelation, Tombstonable};
