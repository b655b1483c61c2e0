//! # Bookstore payment server
//! This crate hosts the HTTP surface of the bookstore. It is responsible for:
//! * Turning customer carts into orders and hosted checkout sessions (`POST /api/orders`).
//! * Listening for incoming webhook deliveries from the payment gateway, verifying their
//!   signatures, and reconciling them against the order state machine.
//! * The admin catalog surface: books, cover art, coupons, soft delete and restore.
//! * Running the background purge worker that permanently removes expired tombstones.
//!
//! ## Configuration
//! The server is configured via environment variables (prefix `BPS_`). See [config] for more
//! information.

pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod purge_worker;
pub mod routes;
pub mod server;
pub mod webhook_routes;

#[cfg(test)]
mod endpoint_tests;
