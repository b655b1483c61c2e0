use log::debug;
use sqlx::SqliteConnection;

use crate::{db_types::CartLine, traits::StorefrontError};

pub async fn upsert_cart_item(
    customer_id: &str,
    book_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<(), StorefrontError> {
    sqlx::query(
        r#"
            INSERT INTO cart_items (customer_id, book_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, book_id) DO UPDATE SET quantity = excluded.quantity
        "#,
    )
    .bind(customer_id)
    .bind(book_id)
    .bind(quantity)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn fetch_cart(customer_id: &str, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    sqlx::query_as("SELECT book_id, quantity FROM cart_items WHERE customer_id = $1 ORDER BY id")
        .bind(customer_id)
        .fetch_all(conn)
        .await
}

/// Empties the customer's cart. Called once the converted order has its gateway session, so an
/// aborted checkout never costs the customer their cart.
pub async fn drain_cart(customer_id: &str, conn: &mut SqliteConnection) -> Result<u64, StorefrontError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1").bind(customer_id).execute(conn).await?;
    debug!("🛒️ Drained {} cart line(s) for customer {customer_id}", result.rows_affected());
    Ok(result.rows_affected())
}
