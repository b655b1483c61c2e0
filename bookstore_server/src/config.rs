use std::env;

use chrono::Duration;
use log::*;
use stripe_tools::StripeConfig;

const DEFAULT_BPS_HOST: &str = "127.0.0.1";
const DEFAULT_BPS_PORT: u16 = 8360;
const DEFAULT_PURGE_INTERVAL: Duration = Duration::hours(1);

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// How often the purge worker sweeps expired tombstones. The retention window itself lives
    /// in the database settings table.
    pub purge_interval: Duration,
    /// Payment gateway configuration.
    pub stripe_config: StripeConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_BPS_HOST.to_string(),
            port: DEFAULT_BPS_PORT,
            database_url: String::default(),
            purge_interval: DEFAULT_PURGE_INTERVAL,
            stripe_config: StripeConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("BPS_HOST").ok().unwrap_or_else(|| DEFAULT_BPS_HOST.into());
        let port = env::var("BPS_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for BPS_PORT. {e} Using the default, {DEFAULT_BPS_PORT}, instead."
                    );
                    DEFAULT_BPS_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_BPS_PORT);
        let database_url = env::var("BPS_DATABASE_URL").unwrap_or_else(|_| {
            warn!("🪛️ BPS_DATABASE_URL is not set. Using the default sqlite database.");
            "sqlite://data/bookstore.db".to_string()
        });
        let purge_interval = env::var("BPS_PURGE_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Duration::seconds)
            .unwrap_or(DEFAULT_PURGE_INTERVAL);
        let stripe_config = StripeConfig::new_from_env_or_default();
        Self { host, port, database_url, purge_interval, stripe_config }
    }
}
