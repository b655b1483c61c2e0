use chrono::Duration;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::traits::{StorefrontError, Tombstonable};

/// Sets `deleted_at` on the entity row, on every attached row, and on backing blobs that no live
/// attachment references any more. The caller wraps this in a transaction. Returns `false` when
/// the row was missing or already tombstoned.
pub async fn soft_delete<T: Tombstonable>(id: i64, conn: &mut SqliteConnection) -> Result<bool, StorefrontError> {
    let sql = format!(
        "UPDATE {} SET deleted_at = CURRENT_TIMESTAMP WHERE id = $1 AND deleted_at IS NULL",
        T::TABLE
    );
    let rows = sqlx::query(&sql).bind(id).execute(&mut *conn).await?.rows_affected();
    if rows == 0 {
        return Ok(false);
    }
    for rel in T::ATTACHMENTS {
        let sql = format!(
            "UPDATE {} SET deleted_at = CURRENT_TIMESTAMP WHERE {} = $1 AND deleted_at IS NULL",
            rel.table, rel.owner_fk
        );
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        // A blob shared with a live attachment elsewhere stays live.
        let sql = format!(
            "UPDATE {blobs} SET deleted_at = CURRENT_TIMESTAMP WHERE deleted_at IS NULL \
             AND id IN (SELECT {fk} FROM {att} WHERE {owner} = $1) \
             AND NOT EXISTS (SELECT 1 FROM {att} a WHERE a.{fk} = {blobs}.id AND a.deleted_at IS NULL)",
            blobs = rel.blob_table,
            att = rel.table,
            fk = rel.blob_fk,
            owner = rel.owner_fk,
        );
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    }
    debug!("🪦️ Tombstoned {} #{id} and its attachments", T::TABLE);
    Ok(true)
}

/// Clears `deleted_at` on the entity, its tombstoned attachments, and any of their blobs that
/// were themselves tombstoned. Returns `false` when the row was missing or not tombstoned.
pub async fn restore<T: Tombstonable>(id: i64, conn: &mut SqliteConnection) -> Result<bool, StorefrontError> {
    let sql = format!("UPDATE {} SET deleted_at = NULL WHERE id = $1 AND deleted_at IS NOT NULL", T::TABLE);
    let rows = sqlx::query(&sql).bind(id).execute(&mut *conn).await?.rows_affected();
    if rows == 0 {
        return Ok(false);
    }
    for rel in T::ATTACHMENTS {
        let sql = format!(
            "UPDATE {blobs} SET deleted_at = NULL WHERE deleted_at IS NOT NULL \
             AND id IN (SELECT {fk} FROM {att} WHERE {owner} = $1 AND deleted_at IS NOT NULL)",
            blobs = rel.blob_table,
            att = rel.table,
            fk = rel.blob_fk,
            owner = rel.owner_fk,
        );
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
        let sql = format!(
            "UPDATE {} SET deleted_at = NULL WHERE {} = $1 AND deleted_at IS NOT NULL",
            rel.table, rel.owner_fk
        );
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    }
    debug!("🪦️ Restored {} #{id} and its attachments", T::TABLE);
    Ok(true)
}

/// Physically deletes entity rows that have been tombstoned for longer than `retention`, along
/// with their attachment rows and any blobs left with no references at all. Returns the number of
/// entity rows removed.
pub async fn purge<T: Tombstonable>(retention: Duration, conn: &mut SqliteConnection) -> Result<u64, StorefrontError> {
    let cutoff_secs = retention.num_seconds().max(0);
    let sql = format!(
        "SELECT id FROM {} WHERE deleted_at IS NOT NULL AND unixepoch(deleted_at) <= unixepoch('now') - $1",
        T::TABLE
    );
    let expired: Vec<(i64,)> = sqlx::query_as(&sql).bind(cutoff_secs).fetch_all(&mut *conn).await?;
    if expired.is_empty() {
        trace!("🪦️ Nothing to purge from {}", T::TABLE);
        return Ok(0);
    }
    for (id,) in &expired {
        for rel in T::ATTACHMENTS {
            let sql = format!("DELETE FROM {} WHERE {} = $1", rel.table, rel.owner_fk);
            sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
            let sql = format!(
                "DELETE FROM {blobs} WHERE NOT EXISTS (SELECT 1 FROM {att} a WHERE a.{fk} = {blobs}.id)",
                blobs = rel.blob_table,
                att = rel.table,
                fk = rel.blob_fk,
            );
            sqlx::query(&sql).execute(&mut *conn).await?;
        }
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        sqlx::query(&sql).bind(id).execute(&mut *conn).await?;
    }
    debug!("🪦️ Purged {} expired tombstones from {}", expired.len(), T::TABLE);
    Ok(expired.len() as u64)
}
