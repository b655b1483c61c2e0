use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use bookstore_engine::{
    events::{EventBroadcaster, EventHandlers, EventHooks},
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::stripe::StripeGateway,
    middleware::SignatureMiddlewareFactory,
    purge_worker::start_purge_worker,
    routes::{
        add_book,
        add_cart_item,
        add_coupon,
        book_by_id,
        cancel_order,
        create_order,
        delete_book,
        fulfill_order,
        health,
        order_by_number,
        restore_book,
    },
    webhook_routes::gateway_webhook,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let handlers = EventHandlers::new(32, default_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;
    start_purge_worker(db.clone(), producers.clone(), config.purge_interval);
    let broadcaster = EventBroadcaster::default();
    let srv = create_server_instance(config, db, producers, broadcaster)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// The default event wiring: log order lifecycle milestones and catalog changes. Downstream
/// consumers (search reindexing, mail) subscribe here.
fn default_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_order_paid(|ev| {
        Box::pin(async move {
            info!("🪝️ Order [{}] paid. Total: {}", ev.order.order_number, ev.order.total_amount);
        })
    });
    hooks.on_catalog_changed(|ev| {
        Box::pin(async move {
            debug!("🪝️ Catalog change: {} #{} {:?}", ev.entity, ev.entity_id, ev.change);
        })
    });
    hooks
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    producers: bookstore_engine::events::EventProducers,
    broadcaster: EventBroadcaster,
) -> Result<Server, ServerError> {
    let gateway = StripeGateway::new(config.stripe_config.clone())
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let webhook_secret = config.stripe_config.webhook_secret.clone();
    let srv = HttpServer::new(move || {
        let orders_api = OrderFlowApi::new(db.clone(), gateway.clone(), producers.clone(), broadcaster.clone());
        let catalog_api = CatalogApi::new(db.clone(), producers.clone());
        let app = App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("bps::access_log"))
            .app_data(web::Data::new(orders_api))
            .app_data(web::Data::new(catalog_api))
            .app_data(web::Data::new(db.clone()));
        let api_scope = web::scope("/api")
            .route("/orders", web::post().to(create_order::<SqliteDatabase, StripeGateway>))
            .route("/orders/{order_number}", web::get().to(order_by_number::<SqliteDatabase, StripeGateway>))
            .route("/orders/{order_number}/cancel", web::post().to(cancel_order::<SqliteDatabase, StripeGateway>))
            .route("/orders/{order_number}/fulfill", web::post().to(fulfill_order::<SqliteDatabase, StripeGateway>))
            .route("/cart/items", web::post().to(add_cart_item::<SqliteDatabase>))
            .route("/books", web::post().to(add_book::<SqliteDatabase>))
            .route("/books/{id}", web::get().to(book_by_id::<SqliteDatabase>))
            .route("/books/{id}", web::delete().to(delete_book::<SqliteDatabase>))
            .route("/books/{id}/restore", web::post().to(restore_book::<SqliteDatabase>))
            .route("/coupons", web::post().to(add_coupon::<SqliteDatabase>));
        // No handler behind this scope ever sees an unverified payload
        let webhook_scope = web::scope("/webhook")
            .wrap(SignatureMiddlewareFactory::new(webhook_secret.clone()))
            .route("/payment_gateway", web::post().to(gateway_webhook::<SqliteDatabase, StripeGateway>));
        app.service(health).service(api_scope).service(webhook_scope)
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
