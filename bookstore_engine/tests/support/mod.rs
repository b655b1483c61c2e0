use bookstore_engine::{
    db_types::{Book, NewBook, ShippingAddress},
    events::{EventBroadcaster, EventProducers},
    test_utils::{prepare_test_env, random_db_path, TestGateway},
    traits::StorefrontDatabase,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};
use bps_common::Money;

pub async fn new_test_db() -> SqliteDatabase {
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

pub fn new_order_api(db: SqliteDatabase, gateway: TestGateway) -> OrderFlowApi<SqliteDatabase, TestGateway> {
    OrderFlowApi::new(db, gateway, EventProducers::default(), EventBroadcaster::default())
}

pub fn new_catalog_api(db: SqliteDatabase) -> CatalogApi<SqliteDatabase> {
    CatalogApi::new(db, EventProducers::default())
}

pub fn test_address() -> ShippingAddress {
    ShippingAddress {
        name: "Alice Reader".to_string(),
        line1: "1 Library Lane".to_string(),
        line2: None,
        city: "Booktown".to_string(),
        postcode: "4321".to_string(),
        country: "US".to_string(),
    }
}

/// Seeds the standard two-book catalog used by the order-flow tests: "Dune" at $10.00 with 10 in
/// stock and "Emma" at $5.00 with 5 in stock.
pub async fn seed_catalog(db: &SqliteDatabase) -> (Book, Book) {
    let dune = db
        .insert_book(NewBook::new("Dune", Money::from_cents(1000), 10).by("Frank Herbert"))
        .await
        .expect("Error inserting book");
    let emma = db
        .insert_book(NewBook::new("Emma", Money::from_cents(500), 5).by("Jane Austen"))
        .await
        .expect("Error inserting book");
    (dune, emma)
}

/// Loads a customer's cart with 2 copies of the first book and 1 of the second ($25.00 subtotal
/// against [`seed_catalog`]).
pub async fn fill_cart(db: &SqliteDatabase, customer_id: &str, first: &Book, second: &Book) {
    db.upsert_cart_item(customer_id, first.id, 2).await.expect("Error adding to cart");
    db.upsert_cart_item(customer_id, second.id, 1).await.expect("Error adding to cart");
}
