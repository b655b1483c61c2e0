//! The public engine APIs the server layer is written against.
//!
//! [`OrderFlowApi`] owns the order lifecycle: checkout, webhook reconciliation, cancellation and
//! fulfilment. [`CatalogApi`] owns the catalog: books, cover art, coupons, and the tombstone
//! operations.
mod catalog_api;
mod order_flow_api;

pub use catalog_api::CatalogApi;
pub use order_flow_api::OrderFlowApi;
