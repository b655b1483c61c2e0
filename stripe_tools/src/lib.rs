//! A thin client for the hosted-checkout payment gateway.
//!
//! The crate covers the two directions the payment server talks to the gateway in:
//! * Outbound: [`StripeApi`] creates hosted checkout sessions for new orders ([`mod@api`]).
//! * Inbound: [`mod@webhook`] verifies the signature on webhook deliveries and parses the payload
//!   into a closed [`WebhookEvent`] enum.
//!
//! The crate knows nothing about orders or inventory. It only deals in the gateway's own terms
//! (sessions, line items, events), which keeps it reusable and keeps gateway quirks out of the
//! payment engine.
mod api;
mod config;
mod data_objects;
mod error;
pub mod helpers;
pub mod webhook;

pub use api::StripeApi;
pub use config::StripeConfig;
pub use data_objects::{CheckoutLineItem, CheckoutSession, CheckoutSessionRequest, SessionId};
pub use error::GatewayError;
pub use webhook::{SignatureError, WebhookEvent};
