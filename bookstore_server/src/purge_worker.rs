use chrono::Duration;
use bookstore_engine::{events::EventProducers, CatalogApi, SqliteDatabase};
use log::*;
use tokio::task::JoinHandle;

/// Starts the tombstone purge worker. Do not await the returned JoinHandle, as it will run
/// indefinitely.
pub fn start_purge_worker(db: SqliteDatabase, producers: EventProducers, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = interval.to_std().unwrap_or(std::time::Duration::from_secs(3600));
        let mut timer = tokio::time::interval(period);
        let api = CatalogApi::new(db, producers);
        info!("🕰️ Tombstone purge worker started. Sweeping every {interval}");
        loop {
            timer.tick().await;
            debug!("🕰️ Running tombstone purge sweep");
            match api.purge_expired().await {
                Ok(0) => trace!("🕰️ Nothing to purge"),
                Ok(n) => info!("🕰️ Purged {n} expired tombstone(s)"),
                Err(e) => error!("🕰️ Error running tombstone purge sweep: {e}"),
            }
        }
    })
}
