use sqlx::SqliteConnection;

use crate::{
    db_types::{Coupon, NewCoupon},
    traits::StorefrontError,
};

pub async fn insert_coupon(coupon: NewCoupon, conn: &mut SqliteConnection) -> Result<Coupon, StorefrontError> {
    let coupon = sqlx::query_as(
        r#"
            INSERT INTO coupons (code, percent_off, amount_off, active)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(coupon.code)
    .bind(coupon.percent_off)
    .bind(coupon.amount_off)
    .bind(coupon.active)
    .fetch_one(conn)
    .await?;
    Ok(coupon)
}

/// Coupon codes are case-insensitive on lookup. Tombstoned coupons are excluded.
pub async fn fetch_coupon_by_code(code: &str, conn: &mut SqliteConnection) -> Result<Option<Coupon>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM coupons WHERE code = $1 COLLATE NOCASE AND deleted_at IS NULL")
        .bind(code)
        .fetch_optional(conn)
        .await
}
