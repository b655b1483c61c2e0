use actix_web::{http::StatusCode, test, test::TestRequest};
use bookstore_engine::db_types::OrderStatusType;
use bookstore_engine::traits::StorefrontDatabase;
use chrono::Utc;
use serde_json::json;
use stripe_tools::webhook::{sign_payload, SIGNATURE_HEADER};

use super::helpers::{init_test_service, new_test_db, seed_book_and_cart, TEST_WEBHOOK_SECRET};
use crate::data_objects::{CheckoutResult, JsonResponse};

fn event_payload(event_type: &str, session_id: &str) -> Vec<u8> {
    json!({
        "id": "evt_test_1",
        "type": event_type,
        "data": { "object": { "id": session_id } }
    })
    .to_string()
    .into_bytes()
}

fn signed_request(payload: Vec<u8>) -> TestRequest {
    let signature = sign_payload(TEST_WEBHOOK_SECRET, Utc::now().timestamp(), &payload);
    TestRequest::post()
        .uri("/webhook/payment_gateway")
        .insert_header((SIGNATURE_HEADER, signature))
        .insert_header(("content-type", "application/json"))
        .set_payload(payload)
}

#[actix_web::test]
async fn unsigned_webhooks_are_rejected() {
    let db = new_test_db().await;
    let service = init_test_service(db).await;
    let payload = event_payload("checkout.session.completed", "cs_test_123");
    let req = TestRequest::post().uri("/webhook/payment_gateway").set_payload(payload).to_request();
    let err = test::try_call_service(&service, req).await.expect_err("Unsigned request should be rejected");
    assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn tampered_webhooks_are_rejected() {
    let db = new_test_db().await;
    let service = init_test_service(db).await;
    let payload = event_payload("checkout.session.completed", "cs_test_123");
    let signature = sign_payload("whsec_wrong_secret", Utc::now().timestamp(), &payload);
    let req = TestRequest::post()
        .uri("/webhook/payment_gateway")
        .insert_header((SIGNATURE_HEADER, signature))
        .set_payload(payload)
        .to_request();
    let err = test::try_call_service(&service, req).await.expect_err("Bad signature should be rejected");
    assert_eq!(err.as_response_error().status_code(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn completed_event_marks_the_order_paid() {
    let db = new_test_db().await;
    seed_book_and_cart(&db, "alice", 10).await;
    let service = init_test_service(db.clone()).await;

    let body = json!({
        "customer_id": "alice",
        "shipping": {
            "name": "Alice Reader",
            "line1": "1 Library Lane",
            "city": "Booktown",
            "postcode": "4321",
            "country": "US"
        }
    });
    let req = TestRequest::post().uri("/api/orders").set_json(body).to_request();
    let resp = test::call_service(&service, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let checkout: CheckoutResult = test::read_body_json(resp).await;

    let payload = event_payload("checkout.session.completed", &checkout.gateway_session_id);
    let resp = test::call_service(&service, signed_request(payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(resp).await;
    assert!(ack.success);

    let order = db.fetch_order_by_number(&checkout.order.order_number).await.unwrap().expect("Order missing");
    assert_eq!(order.status, OrderStatusType::Paid);

    // The gateway retries; the duplicate is absorbed with a 200
    let payload = event_payload("checkout.session.completed", &checkout.gateway_session_id);
    let resp = test::call_service(&service, signed_request(payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let order = db.fetch_order_by_number(&checkout.order.order_number).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatusType::Paid);
}

#[actix_web::test]
async fn unknown_sessions_are_acknowledged_not_retried() {
    let db = new_test_db().await;
    let service = init_test_service(db).await;
    let payload = event_payload("checkout.session.completed", "cs_test_never_issued");
    let resp = test::call_service(&service, signed_request(payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(resp).await;
    assert!(ack.success);
}

#[actix_web::test]
async fn unmapped_event_types_are_acknowledged() {
    let db = new_test_db().await;
    let service = init_test_service(db).await;
    let payload = event_payload("invoice.created", "in_test_1");
    let resp = test::call_service(&service, signed_request(payload).to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let ack: JsonResponse = test::read_body_json(resp).await;
    assert!(ack.success);
}
