use actix_web::{http::StatusCode, test, test::TestRequest};
use serde_json::json;

use super::helpers::{init_test_service, new_test_db, seed_book_and_cart};
use crate::data_objects::CheckoutResult;

fn order_body(customer_id: &str) -> serde_json::Value {
    json!({
        "customer_id": customer_id,
        "shipping": {
            "name": "Alice Reader",
            "line1": "1 Library Lane",
            "city": "Booktown",
            "postcode": "4321",
            "country": "US"
        }
    })
}

#[actix_web::test]
async fn health_check() {
    let db = new_test_db().await;
    let service = init_test_service(db).await;
    let req = TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn create_order_returns_the_session_to_redirect_to() {
    let db = new_test_db().await;
    seed_book_and_cart(&db, "alice", 10).await;
    let service = init_test_service(db).await;

    let req = TestRequest::post().uri("/api/orders").set_json(order_body("alice")).to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let result: CheckoutResult = test::read_body_json(resp).await;
    // 2 x $12.50 + 10% tax + $5.00 shipping
    assert_eq!(result.order.total_amount.value(), 3250);
    assert!(result.gateway_session_id.starts_with("cs_test_"));
    assert_eq!(result.items.len(), 1);
}

#[actix_web::test]
async fn create_order_with_empty_cart_is_unprocessable() {
    let db = new_test_db().await;
    let service = init_test_service(db).await;
    let req = TestRequest::post().uri("/api/orders").set_json(order_body("nobody")).to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[actix_web::test]
async fn create_order_without_stock_is_unprocessable() {
    let db = new_test_db().await;
    // Cart wants 2 copies, only 1 exists
    seed_book_and_cart(&db, "bob", 1).await;
    let service = init_test_service(db).await;
    let req = TestRequest::post().uri("/api/orders").set_json(order_body("bob")).to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}
