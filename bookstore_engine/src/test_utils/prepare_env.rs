//! Throwaway database bootstrap for the integration suites.
//!
//! Every test builds its own file-backed SQLite database so suites can run in parallel without
//! sharing state. The files land under `data/` and are ignored by git.
use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

/// Creates a fresh, fully migrated database at `url`, replacing any leftover file from a
/// previous run. Loads `.env.test` and initialises the logger on the way (both are no-ops after
/// the first call in a process).
pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    recreate_database(url).await;
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Could not open the test database");
    migrate!("./migrations").run(db.pool()).await.expect("Migrations failed");
    debug!("🧪️ Test database ready at {url}");
}

/// A unique database URL per call, so concurrently running tests never collide.
pub fn random_db_path() -> String {
    format!("sqlite://../data/test_store_{}.db", rand::random::<u64>())
}

async fn recreate_database(url: &str) {
    if let Err(e) = Sqlite::drop_database(url).await {
        trace!("🧪️ Nothing to drop at {url}: {e}");
    }
    Sqlite::create_database(url).await.expect("Could not create the test database");
}
