use chrono::Duration;
use thiserror::Error;

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
    order_objects::CheckoutDraft,
    pricing::PricingConfig,
    traits::Tombstonable,
};

/// The storage behaviour a backend must provide to support the order engine.
///
/// The inventory ledger lives behind this trait: stock decrements are conditional row-level
/// updates executed inside a transaction, so concurrent checkouts for the last unit of a book
/// race safely at the database rather than behind an application lock.
#[allow(async_fn_in_trait)]
pub trait StorefrontDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    // ------------------------------- Order creation and the inventory ledger ----------------------------------

    /// Converts the customer's cart into a `PendingPayment` order in a single atomic transaction:
    ///
    /// * every referenced book must exist and not be tombstoned;
    /// * stock for the whole item set is decremented via conditional updates
    ///   (`stock_quantity >= qty`) — if any line cannot be satisfied the transaction rolls back
    ///   and `InsufficientStock` names the offending book; no partial decrement survives;
    /// * item prices are frozen from the current catalog price;
    /// * totals are computed per `pricing` with `total = subtotal - discount + tax + shipping`;
    /// * the order and its items are inserted.
    ///
    /// The cart itself is *not* drained here; that happens in [`Self::attach_gateway_session`]
    /// once the gateway has accepted the session, so a failed checkout leaves the cart untouched.
    async fn checkout_cart(
        &self,
        customer_id: &str,
        shipping: &ShippingAddress,
        coupon: Option<&Coupon>,
        pricing: &PricingConfig,
    ) -> Result<CheckoutDraft, StorefrontError>;

    /// Stores the gateway's session id on the order and drains the customer's cart, in one
    /// transaction. Completes the creation flow; from here on the order is resolvable by webhook.
    async fn attach_gateway_session(
        &self,
        order_id: i64,
        session_id: &GatewaySessionId,
    ) -> Result<Order, StorefrontError>;

    /// Compensating action for a failed checkout: restores the stock reserved by
    /// [`Self::checkout_cart`] and removes the order and its items again. Only legal while the
    /// order is still `PendingPayment` with no gateway session attached — i.e. before the order
    /// was ever visible to the outside world.
    async fn abandon_checkout(&self, order_id: i64) -> Result<(), StorefrontError>;

    /// Restores the exact quantities reserved for the token's order. Idempotent: the order's
    /// `stock_released` flag is flipped with a conditional update, so a second release of the
    /// same token restores nothing and returns `false`.
    async fn release_reservation(&self, token: &ReservationToken) -> Result<bool, StorefrontError>;

    // ------------------------------- Orders ----------------------------------

    async fn fetch_order_by_number(&self, order_number: &OrderNumber) -> Result<Option<Order>, StorefrontError>;

    async fn fetch_order_by_session(&self, session_id: &GatewaySessionId) -> Result<Option<Order>, StorefrontError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, StorefrontError>;

    /// Applies `from -> to` as a conditional update keyed on the expected current status.
    /// Returns `None` when the order is no longer in `from` — the sole serialization point for
    /// concurrent webhook deliveries: one racer wins, the loser's update matches zero rows.
    async fn transition_order(
        &self,
        order_id: i64,
        from: OrderStatusType,
        to: OrderStatusType,
    ) -> Result<Option<Order>, StorefrontError>;

    // ------------------------------- Carts ----------------------------------

    /// Adds to (or replaces the quantity of) a cart line.
    async fn upsert_cart_item(&self, customer_id: &str, book_id: i64, quantity: i64) -> Result<(), StorefrontError>;

    async fn fetch_cart(&self, customer_id: &str) -> Result<Vec<CartLine>, StorefrontError>;

    // ------------------------------- Catalog ----------------------------------

    async fn insert_book(&self, book: NewBook) -> Result<Book, StorefrontError>;

    /// Fetches a live (non-tombstoned) book.
    async fn fetch_book(&self, book_id: i64) -> Result<Option<Book>, StorefrontError>;

    /// Fetches a book whether or not it is tombstoned. Admin surface only.
    async fn fetch_book_any(&self, book_id: i64) -> Result<Option<Book>, StorefrontError>;

    /// Links cover art to a book. The backing blob is deduplicated on its storage key, so two
    /// books with identical cover art share one blob row.
    async fn attach_cover_image(&self, book_id: i64, storage_key: &str) -> Result<CoverImage, StorefrontError>;

    async fn insert_coupon(&self, coupon: NewCoupon) -> Result<Coupon, StorefrontError>;

    async fn fetch_coupon_by_code(&self, code: &str) -> Result<Option<Coupon>, StorefrontError>;

    // ------------------------------- Tombstones ----------------------------------

    /// Sets `deleted_at` on the entity and each of its declared attachments; tombstones backing
    /// blobs that no live attachment references any more. Returns `false` if the row was missing
    /// or already tombstoned.
    async fn soft_delete<T: Tombstonable>(&self, id: i64) -> Result<bool, StorefrontError>;

    /// Clears `deleted_at` on the entity, its tombstoned attachments, and those attachments'
    /// blobs where the blob itself was tombstoned. Returns `false` if the row was missing or not
    /// tombstoned.
    async fn restore<T: Tombstonable>(&self, id: i64) -> Result<bool, StorefrontError>;

    /// Irreversibly deletes rows tombstoned for longer than `retention`, along with their
    /// attachment rows and any blobs left unreferenced. Returns the number of entity rows purged.
    async fn purge_tombstones<T: Tombstonable>(&self, retention: Duration) -> Result<u64, StorefrontError>;

    // ------------------------------- Settings ----------------------------------

    /// Loads the pricing policy (tax rate, shipping fee) from the settings table.
    async fn load_pricing(&self) -> Result<PricingConfig, StorefrontError>;

    /// Loads the tombstone retention window from the settings table.
    async fn purge_retention(&self) -> Result<Duration, StorefrontError>;
}

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("An internal database error occurred: {0}")]
    DatabaseError(String),
    #[error("Invalid checkout request. {0}")]
    Validation(String),
    #[error("Not enough stock for \"{title}\" (book #{book_id})")]
    InsufficientStock { book_id: i64, title: String },
    #[error("Coupon code {0} is unknown or inactive")]
    InvalidCoupon(String),
    #[error("Coupon #{0} is misconfigured. Exactly one of percent_off and amount_off must be set")]
    CouponMisconfigured(i64),
    #[error("The payment gateway rejected the checkout session. {0}")]
    Gateway(String),
    #[error("Order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Book #{0} does not exist or is deleted")]
    BookNotFound(i64),
    #[error("Order {order} cannot leave {from} on {event}")]
    IllegalTransition { order: OrderNumber, from: OrderStatusType, event: String },
}

impl From<sqlx::Error> for StorefrontError {
    fn from(e: sqlx::Error) -> Self {
        StorefrontError::DatabaseError(e.to_string())
    }
}
