use bps_common::Secret;
use log::*;

#[derive(Debug, Clone, Default)]
pub struct StripeConfig {
    /// Base URL of the gateway REST API, e.g. "https://api.stripe.com"
    pub api_url: String,
    /// The secret API key used to authenticate outbound calls.
    pub secret_key: Secret<String>,
    /// The shared secret used to verify webhook signatures.
    pub webhook_secret: Secret<String>,
    /// Where the gateway sends the customer after a successful checkout.
    pub success_url: String,
    /// Where the gateway sends the customer if they abandon the checkout.
    pub cancel_url: String,
}

const DEFAULT_API_URL: &str = "https://api.stripe.com";

impl StripeConfig {
    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("BPS_STRIPE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());
        let secret_key = Secret::new(std::env::var("BPS_STRIPE_SECRET_KEY").unwrap_or_else(|_| {
            warn!("BPS_STRIPE_SECRET_KEY not set, using a placeholder that will fail against the live gateway");
            "sk_test_000000000000".to_string()
        }));
        let webhook_secret = Secret::new(std::env::var("BPS_STRIPE_WEBHOOK_SECRET").unwrap_or_else(|_| {
            warn!("BPS_STRIPE_WEBHOOK_SECRET not set, webhook signature checks will reject everything");
            "whsec_000000000000".to_string()
        }));
        let success_url = std::env::var("BPS_CHECKOUT_SUCCESS_URL")
            .unwrap_or_else(|_| "http://localhost:3000/checkout/success".to_string());
        let cancel_url = std::env::var("BPS_CHECKOUT_CANCEL_URL")
            .unwrap_or_else(|_| "http://localhost:3000/checkout/cancel".to_string());
        Self { api_url, secret_key, webhook_secret, success_url, cancel_url }
    }
}
