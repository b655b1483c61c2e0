//! Bookstore Order Engine
//!
//! The engine holds the core logic of the bookstore's order and payment flows: converting carts
//! into orders with atomically reserved stock, pricing them through the coupon and tax policy,
//! reconciling payment-gateway webhook events against the order state machine, and managing the
//! catalog's soft-delete lifecycle. It is gateway- and web-framework-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). SQLite is the supported backend. You
//!    should never need to access the database directly; use the public APIs instead. The
//!    exception is the data types stored in the database, which are defined in [`mod@db_types`]
//!    and are public.
//! 2. The engine public API ([`OrderFlowApi`] and [`CatalogApi`]). These provide the
//!    public-facing functionality. Storage backends implement the traits in [`mod@traits`] to
//!    plug in underneath them, and payment gateways implement
//!    [`CheckoutGateway`](traits::CheckoutGateway).
//!
//! The engine also emits events when orders move through their lifecycle or the catalog changes.
//! A simple actor framework lets you hook into these events and perform custom actions, and a
//! topic broadcaster ([`events::EventBroadcaster`]) fans lifecycle events out to any number of
//! live subscribers.
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod order_objects;
pub mod pricing;
#[cfg(feature = "sqlite")]
mod sqlite;
mod store_api;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use store_api::{CatalogApi, OrderFlowApi};
