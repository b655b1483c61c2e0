use actix_http::Request;
use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceResponse},
    test,
    web,
    App,
    Error,
};
use bookstore_engine::{
    db_types::NewBook,
    events::{EventBroadcaster, EventProducers},
    test_utils::{prepare_test_env, random_db_path, TestGateway},
    traits::StorefrontDatabase,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};
use bps_common::{Money, Secret};

use crate::{
    routes::{create_order, health},
    webhook_routes::gateway_webhook,
};

pub const TEST_WEBHOOK_SECRET: &str = "whsec_endpoint_tests";

pub async fn new_test_db() -> SqliteDatabase {
    let _ = env_logger::try_init();
    let url = random_db_path();
    prepare_test_env(&url).await;
    SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database")
}

/// Builds the same service tree the real server runs, against a throwaway database and the
/// in-memory gateway.
pub async fn init_test_service(
    db: SqliteDatabase,
) -> impl Service<Request, Response = ServiceResponse<BoxBody>, Error = Error> {
    let orders_api =
        OrderFlowApi::new(db.clone(), TestGateway::new(), EventProducers::default(), EventBroadcaster::default());
    let catalog_api = CatalogApi::new(db.clone(), EventProducers::default());
    let webhook_secret = Secret::new(TEST_WEBHOOK_SECRET.to_string());
    let app = App::new()
        .app_data(web::Data::new(orders_api))
        .app_data(web::Data::new(catalog_api))
        .app_data(web::Data::new(db))
        .service(health)
        .service(
            web::scope("/api").route("/orders", web::post().to(create_order::<SqliteDatabase, TestGateway>)),
        )
        .service(
            web::scope("/webhook")
                .wrap(crate::middleware::SignatureMiddlewareFactory::new(webhook_secret))
                .route("/payment_gateway", web::post().to(gateway_webhook::<SqliteDatabase, TestGateway>)),
        );
    test::init_service(app).await
}

/// Seeds one book and a single-customer cart holding two copies of it.
pub async fn seed_book_and_cart(db: &SqliteDatabase, customer_id: &str, stock: i64) -> i64 {
    let book = db
        .insert_book(NewBook::new("The Name of the Rose", Money::from_cents(1250), stock).by("Umberto Eco"))
        .await
        .expect("Error inserting book");
    db.upsert_cart_item(customer_id, book.id, 2).await.expect("Error adding to cart");
    book.id
}
