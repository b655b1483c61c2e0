use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{GatewaySessionId, Order, OrderItem, OrderNumber, OrderStatusType, ShippingAddress},
    order_objects::PricedItem,
    pricing::OrderTotals,
    traits::StorefrontError,
};

/// Inserts a new `PendingPayment` order row. Totals arrive pre-computed and already satisfy
/// `total = subtotal - discount + tax + shipping`; the caller is responsible for wrapping this
/// in the same transaction as the stock reservation.
pub async fn insert_order(
    order_number: &OrderNumber,
    customer_id: &str,
    shipping: &ShippingAddress,
    coupon_id: Option<i64>,
    totals: &OrderTotals,
    conn: &mut SqliteConnection,
) -> Result<Order, StorefrontError> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                subtotal,
                discount_amount,
                tax_amount,
                shipping_cost,
                total_amount,
                coupon_id,
                ship_name,
                ship_line1,
                ship_line2,
                ship_city,
                ship_postcode,
                ship_country
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *;
        "#,
    )
    .bind(order_number)
    .bind(customer_id)
    .bind(totals.subtotal)
    .bind(totals.discount)
    .bind(totals.tax)
    .bind(totals.shipping)
    .bind(totals.total)
    .bind(coupon_id)
    .bind(&shipping.name)
    .bind(&shipping.line1)
    .bind(&shipping.line2)
    .bind(&shipping.city)
    .bind(&shipping.postcode)
    .bind(&shipping.country)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

/// Inserts the frozen price snapshot for each line of the order. Items are never mutated after
/// this point.
pub async fn insert_order_items(
    order_id: i64,
    items: &[PricedItem],
    conn: &mut SqliteConnection,
) -> Result<(), StorefrontError> {
    for item in items {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, book_id, quantity, unit_price, total_price)
                VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(order_id)
        .bind(item.book_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.total_price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_order_by_number(
    order_number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(order_number.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn fetch_order_by_session(
    session_id: &GatewaySessionId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE gateway_session_id = $1")
        .bind(session_id.as_str())
        .fetch_optional(conn)
        .await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

/// Stores the gateway session id on the order. Each order holds at most one session for life.
pub async fn set_gateway_session(
    order_id: i64,
    session_id: &GatewaySessionId,
    conn: &mut SqliteConnection,
) -> Result<Order, StorefrontError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET gateway_session_id = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND gateway_session_id IS NULL
            RETURNING *
        "#,
    )
    .bind(session_id.as_str())
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    result.ok_or_else(|| StorefrontError::DatabaseError(format!("order {order_id} already has a gateway session")))
}

/// The single serialization point for status changes: the update is keyed on the expected
/// current status, so of two racing transitions exactly one matches a row. `None` means this
/// caller lost the race (or the event was a duplicate / out of order).
pub async fn transition_order(
    order_id: i64,
    from: OrderStatusType,
    to: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StorefrontError> {
    let result: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *
        "#,
    )
    .bind(to.to_string())
    .bind(order_id)
    .bind(from.to_string())
    .fetch_optional(conn)
    .await?;
    trace!("📝️ Transition {from} -> {to} for order id {order_id}: {}", if result.is_some() { "applied" } else { "no-op" });
    Ok(result)
}

/// Flips the order's `stock_released` flag, conditionally. Returns `false` if the flag was
/// already set — the guard that makes reservation release idempotent.
pub async fn mark_stock_released(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, StorefrontError> {
    let result = sqlx::query(
        "UPDATE orders SET stock_released = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 AND stock_released = 0",
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Removes an order that never completed creation (no gateway session, still `PendingPayment`).
/// This is the only path that ever deletes from the orders table; completed orders are a
/// financial record and are never removed.
pub async fn delete_unexposed_order(order_id: i64, conn: &mut SqliteConnection) -> Result<bool, StorefrontError> {
    sqlx::query("DELETE FROM order_items WHERE order_id = $1").bind(order_id).execute(&mut *conn).await?;
    let result = sqlx::query(
        "DELETE FROM orders WHERE id = $1 AND gateway_session_id IS NULL AND status = 'PendingPayment'",
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
