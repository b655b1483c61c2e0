use bps_common::Money;
use sqlx::SqliteConnection;

use crate::pricing::PricingConfig;

async fn fetch_setting(name: &str, conn: &mut SqliteConnection) -> Result<Option<i64>, sqlx::Error> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT value FROM settings WHERE name = $1").bind(name).fetch_optional(conn).await?;
    Ok(row.map(|(value,)| value))
}

/// Loads the pricing knobs from the settings table, falling back to compiled-in defaults for any
/// missing entry.
pub async fn load_pricing(conn: &mut SqliteConnection) -> Result<PricingConfig, sqlx::Error> {
    let mut config = PricingConfig::default();
    if let Some(bps) = fetch_setting("tax_rate_bps", &mut *conn).await? {
        config.tax_rate_bps = bps;
    }
    if let Some(cents) = fetch_setting("shipping_fee_cents", conn).await? {
        config.shipping_fee = Money::from_cents(cents);
    }
    Ok(config)
}

pub const DEFAULT_PURGE_RETENTION_DAYS: i64 = 7;

pub async fn purge_retention_days(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    Ok(fetch_setting("purge_retention_days", conn).await?.unwrap_or(DEFAULT_PURGE_RETENTION_DAYS))
}
