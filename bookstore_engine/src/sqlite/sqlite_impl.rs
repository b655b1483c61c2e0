//! `SqliteDatabase` is a concrete implementation of the bookstore order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the traits defined in the
//! [`crate::traits`] module.
use std::fmt::Debug;

use chrono::Duration;
use log::*;
use sqlx::SqlitePool;

use super::db::{books, carts, coupons, db_url, new_pool, orders, settings, tombstones};
use crate::{
    db_types::{
        Book,
        CartLine,
        Coupon,
        CoverImage,
        GatewaySessionId,
        NewBook,
        NewCoupon,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        ReservationToken,
        ShippingAddress,
    },
    helpers::new_order_number,
    order_objects::{CheckoutDraft, PricedItem},
    pricing::{compute_totals, discount_for, CouponError, PricingConfig},
    traits::{StorefrontDatabase, StorefrontError, Tombstonable},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database connection pool using the URL set in the environment.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        debug!("🗄️ Creating connection pool to database {url}");
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StorefrontDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn checkout_cart(
        &self,
        customer_id: &str,
        shipping: &ShippingAddress,
        coupon: Option<&Coupon>,
        pricing: &PricingConfig,
    ) -> Result<CheckoutDraft, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_cart(customer_id, &mut tx).await?;
        if cart.is_empty() {
            return Err(StorefrontError::Validation(format!("Cart for customer {customer_id} is empty")));
        }
        let mut items = Vec::with_capacity(cart.len());
        for line in &cart {
            if line.quantity <= 0 {
                return Err(StorefrontError::Validation(format!(
                    "Cart line for book #{} has a non-positive quantity",
                    line.book_id
                )));
            }
            let book =
                books::fetch_book(line.book_id, &mut tx).await?.ok_or(StorefrontError::BookNotFound(line.book_id))?;
            // The conditional decrement is the reservation. If it misses, the whole transaction
            // rolls back and every earlier decrement is undone with it.
            if !books::reserve_stock_line(book.id, line.quantity, &mut tx).await? {
                info!("📚️ Not enough stock of '{}' to satisfy checkout for customer {customer_id}", book.title);
                return Err(StorefrontError::InsufficientStock { book_id: book.id, title: book.title });
            }
            items.push(PricedItem {
                book_id: book.id,
                title: book.title,
                quantity: line.quantity,
                unit_price: book.price,
                total_price: book.price * line.quantity,
            });
        }
        let subtotal = items.iter().map(|i| i.total_price).sum();
        let discount = discount_for(subtotal, coupon).map_err(|e| match e {
            CouponError::Misconfigured(id) => StorefrontError::CouponMisconfigured(id),
        })?;
        let totals = compute_totals(subtotal, discount, pricing);
        let order_number = new_order_number();
        let order =
            orders::insert_order(&order_number, customer_id, shipping, coupon.map(|c| c.id), &totals, &mut tx).await?;
        orders::insert_order_items(order.id, &items, &mut tx).await?;
        tx.commit().await?;
        info!("🛒️ Order [{}] created for customer {customer_id}. Total: {}", order.order_number, order.total_amount);
        Ok(CheckoutDraft { order, items })
    }

    async fn attach_gateway_session(
        &self,
        order_id: i64,
        session_id: &GatewaySessionId,
    ) -> Result<Order, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::set_gateway_session(order_id, session_id, &mut tx).await?;
        carts::drain_cart(&order.customer_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🛒️ Session {session_id} attached to order [{}]; cart drained", order.order_number);
        Ok(order)
    }

    async fn abandon_checkout(&self, order_id: i64) -> Result<(), StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let items = orders::fetch_order_items(order_id, &mut tx).await?;
        if !orders::delete_unexposed_order(order_id, &mut tx).await? {
            return Err(StorefrontError::DatabaseError(format!(
                "Refusing to abandon order id {order_id}: it has a gateway session or has left PendingPayment"
            )));
        }
        for item in &items {
            books::restore_stock_line(item.book_id, item.quantity, &mut tx).await?;
        }
        tx.commit().await?;
        info!("🛒️ Abandoned checkout for order id {order_id}. {} stock line(s) restored", items.len());
        Ok(())
    }

    async fn release_reservation(&self, token: &ReservationToken) -> Result<bool, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        if !orders::mark_stock_released(token.order_id(), &mut tx).await? {
            trace!("📚️ Reservation for order id {} was already released", token.order_id());
            return Ok(false);
        }
        let items = orders::fetch_order_items(token.order_id(), &mut tx).await?;
        for item in &items {
            books::restore_stock_line(item.book_id, item.quantity, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("📚️ Released reservation for order id {} ({} line(s))", token.order_id(), items.len());
        Ok(true)
    }

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_number(order_number, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_session(&self, session_id: &GatewaySessionId) -> Result<Option<Order>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_session(session_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn transition_order(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StorefrontError> {
        // An explicit transaction, even for a single statement: RETURNING rows are streamed, and
        // on a pooled connection the implicit write transaction stays open after the row comes
        // back. The commit pins the transition before any caller can read the order again.
        let mut tx = self.pool.begin().await?;
        let order = orders::transition_order(order_id, from, to, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn upsert_cart_item(&self, customer_id: &str, book_id: i64, quantity: i64) -> Result<(), StorefrontError> {
        if quantity <= 0 {
            return Err(StorefrontError::Validation("Cart quantities must be positive".to_string()));
        }
        let mut conn = self.pool.acquire().await?;
        carts::upsert_cart_item(customer_id, book_id, quantity, &mut conn).await
    }

    async fn fetch_cart(&self, customer_id: &str) -> Result<Vec<CartLine>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart(customer_id, &mut conn).await?;
        Ok(cart)
    }

    async fn insert_book(&self, book: NewBook) -> Result<Book, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let book = books::insert_book(book, &mut tx).await?;
        tx.commit().await?;
        Ok(book)
    }

    async fn fetch_book(&self, book_id: i64) -> Result<Option<Book>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let book = books::fetch_book(book_id, &mut conn).await?;
        Ok(book)
    }

    async fn fetch_book_any(&self, book_id: i64) -> Result<Option<Book>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let book = books::fetch_book_any(book_id, &mut conn).await?;
        Ok(book)
    }

    async fn attach_cover_image(&self, book_id: i64, storage_key: &str) -> Result<CoverImage, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        if books::fetch_book(book_id, &mut tx).await?.is_none() {
            return Err(StorefrontError::BookNotFound(book_id));
        }
        let cover = books::attach_cover_image(book_id, storage_key, &mut tx).await?;
        tx.commit().await?;
        Ok(cover)
    }

    async fn insert_coupon(&self, coupon: NewCoupon) -> Result<Coupon, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let coupon = coupons::insert_coupon(coupon, &mut tx).await?;
        tx.commit().await?;
        Ok(coupon)
    }

    async fn fetch_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let coupon = coupons::fetch_coupon_by_code(code, &mut conn).await?;
        Ok(coupon)
    }

    async fn soft_delete<T: Tombstonable>(&self, id: i64) -> Result<bool, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let deleted = tombstones::soft_delete::<T>(id, &mut tx).await?;
        tx.commit().await?;
        Ok(deleted)
    }

    async fn restore<T: Tombstonable>(&self, id: i64) -> Result<bool, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let restored = tombstones::restore::<T>(id, &mut tx).await?;
        tx.commit().await?;
        Ok(restored)
    }

    async fn purge_tombstones<T: Tombstonable>(&self, retention: Duration) -> Result<u64, StorefrontError> {
        let mut tx = self.pool.begin().await?;
        let purged = tombstones::purge::<T>(retention, &mut tx).await?;
        tx.commit().await?;
        Ok(purged)
    }

    async fn load_pricing(&self) -> Result<PricingConfig, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let pricing = settings::load_pricing(&mut conn).await?;
        Ok(pricing)
    }

    async fn purge_retention(&self) -> Result<Duration, StorefrontError> {
        let mut conn = self.pool.acquire().await?;
        let days = settings::purge_retention_days(&mut conn).await?;
        Ok(Duration::days(days))
    }
}
