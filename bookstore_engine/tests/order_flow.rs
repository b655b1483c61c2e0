use bookstore_engine::{
    db_types::OrderStatusType,
    events::{OrderLifecycleEvent, ADMIN_ORDER_TOPIC},
    order_objects::{Ack, CheckoutRequest, GatewayEvent, IgnoredReason},
    test_utils::TestGateway,
    traits::{StorefrontDatabase, StorefrontError},
};
use bps_common::Money;
use tokio::runtime::Runtime;

mod support;

use support::{fill_cart, new_order_api, new_test_db, seed_catalog, test_address};

fn checkout_request(customer_id: &str) -> CheckoutRequest {
    CheckoutRequest { customer_id: customer_id.to_string(), coupon_code: None, shipping: test_address() }
}

#[test]
fn checkout_prices_the_cart_and_reserves_stock() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "alice", &dune, &emma).await;
        let api = new_order_api(db.clone(), TestGateway::new());

        let checkout = api.checkout(checkout_request("alice")).await.expect("Checkout failed");
        let order = &checkout.order;
        assert_eq!(order.status, OrderStatusType::PendingPayment);
        // $25.00 cart, 10% tax on the discounted subtotal, $5.00 shipping
        assert_eq!(order.subtotal, Money::from_cents(2500));
        assert_eq!(order.discount_amount, Money::ZERO);
        assert_eq!(order.tax_amount, Money::from_cents(250));
        assert_eq!(order.shipping_cost, Money::from_cents(500));
        assert_eq!(order.total_amount, Money::from_cents(3250));
        assert!(order.totals_are_consistent());
        assert!(order.gateway_session_id.is_some());
        assert_eq!(order.ship_name, "Alice Reader");

        // Prices are frozen per line
        let items = db.fetch_order_items(order.id).await.expect("Error fetching items");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].unit_price, Money::from_cents(1000));
        assert_eq!(items[0].total_price, Money::from_cents(2000));

        // Stock has been reserved and the cart drained
        let dune = db.fetch_book(dune.id).await.expect("Error fetching book").expect("Book missing");
        assert_eq!(dune.stock_quantity, 8);
        let cart = db.fetch_cart("alice").await.expect("Error fetching cart");
        assert!(cart.is_empty());
    });
}

#[test]
fn percent_coupon_discounts_before_tax() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "bob", &dune, &emma).await;
        db.insert_coupon(bookstore_engine::db_types::NewCoupon::percent("SPRING20", 20))
            .await
            .expect("Error inserting coupon");
        let api = new_order_api(db, TestGateway::new());

        let mut request = checkout_request("bob");
        // Codes match case-insensitively
        request.coupon_code = Some("spring20".to_string());
        let order = api.checkout(request).await.expect("Checkout failed").order;
        assert_eq!(order.subtotal, Money::from_cents(2500));
        assert_eq!(order.discount_amount, Money::from_cents(500));
        assert_eq!(order.tax_amount, Money::from_cents(200));
        assert_eq!(order.total_amount, Money::from_cents(2700));
        assert!(order.totals_are_consistent());
    });
}

#[test]
fn unknown_coupon_rejects_the_checkout() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "carol", &dune, &emma).await;
        let api = new_order_api(db.clone(), TestGateway::new());

        let mut request = checkout_request("carol");
        request.coupon_code = Some("NOSUCHCODE".to_string());
        let err = api.checkout(request).await.expect_err("Checkout should have failed");
        assert!(matches!(err, StorefrontError::InvalidCoupon(_)));
        // Nothing was reserved
        let dune = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune.stock_quantity, 10);
    });
}

#[test]
fn empty_cart_cannot_be_checked_out() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        seed_catalog(&db).await;
        let api = new_order_api(db, TestGateway::new());
        let err = api.checkout(checkout_request("nobody")).await.expect_err("Checkout should have failed");
        assert!(matches!(err, StorefrontError::Validation(_)));
    });
}

#[test]
fn insufficient_stock_rolls_back_every_line() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        db.upsert_cart_item("dave", dune.id, 2).await.unwrap();
        // Only 5 in stock
        db.upsert_cart_item("dave", emma.id, 6).await.unwrap();
        let api = new_order_api(db.clone(), TestGateway::new());

        let err = api.checkout(checkout_request("dave")).await.expect_err("Checkout should have failed");
        match err {
            StorefrontError::InsufficientStock { book_id, title } => {
                assert_eq!(book_id, emma.id);
                assert_eq!(title, "Emma");
            },
            other => panic!("Unexpected error: {other}"),
        }
        // The earlier line's decrement was rolled back with the transaction
        let dune = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune.stock_quantity, 10);
        // The cart survives a failed checkout
        let cart = db.fetch_cart("dave").await.unwrap();
        assert_eq!(cart.len(), 2);
    });
}

#[test]
fn gateway_refusal_abandons_the_order_and_restores_stock() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "erin", &dune, &emma).await;
        let gateway = TestGateway::failing();
        let api = new_order_api(db.clone(), gateway.clone());

        let err = api.checkout(checkout_request("erin")).await.expect_err("Checkout should have failed");
        assert!(matches!(err, StorefrontError::Gateway(_)));
        assert_eq!(gateway.call_count(), 1);
        let dune = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune.stock_quantity, 10);
        let emma = db.fetch_book(emma.id).await.unwrap().unwrap();
        assert_eq!(emma.stock_quantity, 5);
        let cart = db.fetch_cart("erin").await.unwrap();
        assert_eq!(cart.len(), 2);
    });
}

#[test]
fn completed_webhook_marks_the_order_paid_exactly_once() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "gina", &dune, &emma).await;
        let api = new_order_api(db.clone(), TestGateway::new());

        let order = api.checkout(checkout_request("gina")).await.expect("Checkout failed").order;
        let session = order.gateway_session_id.clone().expect("No session on order");

        let ack = api.process_gateway_event(GatewayEvent::CheckoutCompleted(session.clone())).await.unwrap();
        match ack {
            Ack::Applied(paid) => assert_eq!(paid.status, OrderStatusType::Paid),
            Ack::Ignored(reason) => panic!("Event should have applied, got {reason:?}"),
        }

        // Redelivery of the same event is absorbed
        let ack = api.process_gateway_event(GatewayEvent::CheckoutCompleted(session.clone())).await.unwrap();
        assert!(
            matches!(ack, Ack::Ignored(IgnoredReason::NoLegalTransition { current: OrderStatusType::Paid })),
            "Duplicate should be ignored, got {ack:?}"
        );

        // A stale expiry arriving after payment is absorbed too, and no stock moves
        let ack = api.process_gateway_event(GatewayEvent::CheckoutExpired(session)).await.unwrap();
        assert!(matches!(ack, Ack::Ignored(IgnoredReason::NoLegalTransition { .. })));
        let dune = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune.stock_quantity, 8);

        let fulfilled = api.mark_fulfilled(&order.order_number).await.expect("Fulfilment failed");
        assert_eq!(fulfilled.status, OrderStatusType::Fulfilled);
    });
}

#[test]
fn committed_writes_are_immediately_visible_across_the_pool() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        // Every call below runs on whichever pool connection is free, so a write followed by a
        // read exercises the cross-connection path. There is no grace period: by the time the
        // writing call returns, its transaction has committed.
        let coupon = db
            .insert_coupon(bookstore_engine::db_types::NewCoupon::percent("FLASH15", 15))
            .await
            .expect("Error inserting coupon");
        for _ in 0..5 {
            let found = db.fetch_coupon_by_code("flash15").await.unwrap().expect("Coupon not yet visible");
            assert_eq!(found.id, coupon.id);
        }

        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "lena", &dune, &emma).await;
        let api = new_order_api(db.clone(), TestGateway::new());
        let order = api.checkout(checkout_request("lena")).await.unwrap().order;
        let session = order.gateway_session_id.clone().unwrap();
        api.process_gateway_event(GatewayEvent::CheckoutCompleted(session)).await.unwrap();
        for _ in 0..5 {
            let seen = db.fetch_order_by_number(&order.order_number).await.unwrap().expect("Order missing");
            assert_eq!(seen.status, OrderStatusType::Paid, "Paid transition not yet visible");
        }
    });
}

#[test]
fn expiry_cancels_the_order_and_releases_stock_idempotently() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "hana", &dune, &emma).await;
        let api = new_order_api(db.clone(), TestGateway::new());

        let order = api.checkout(checkout_request("hana")).await.unwrap().order;
        let session = order.gateway_session_id.clone().unwrap();

        let ack = api.process_gateway_event(GatewayEvent::CheckoutExpired(session)).await.unwrap();
        match ack {
            Ack::Applied(cancelled) => assert_eq!(cancelled.status, OrderStatusType::Cancelled),
            Ack::Ignored(reason) => panic!("Event should have applied, got {reason:?}"),
        }
        let dune_after = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune_after.stock_quantity, 10);

        // A second release through the token is a no-op
        let token = bookstore_engine::db_types::ReservationToken::for_order(&order);
        let released = db.release_reservation(&token).await.unwrap();
        assert!(!released);
        let dune_after = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune_after.stock_quantity, 10);
    });
}

#[test]
fn failed_payment_webhook_annuls_the_order() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "ivan", &dune, &emma).await;
        let api = new_order_api(db.clone(), TestGateway::new());

        let order = api.checkout(checkout_request("ivan")).await.unwrap().order;
        let session = order.gateway_session_id.clone().unwrap();
        let ack = api.process_gateway_event(GatewayEvent::PaymentFailed(session)).await.unwrap();
        match ack {
            Ack::Applied(failed) => assert_eq!(failed.status, OrderStatusType::PaymentFailed),
            Ack::Ignored(reason) => panic!("Event should have applied, got {reason:?}"),
        }
        let dune = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune.stock_quantity, 10);
    });
}

#[test]
fn unknown_sessions_and_unmapped_events_are_acknowledged() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let api = new_order_api(db, TestGateway::new());

        let stray = bookstore_engine::db_types::GatewaySessionId::from("cs_test_never_issued".to_string());
        let ack = api.process_gateway_event(GatewayEvent::CheckoutCompleted(stray)).await.unwrap();
        assert!(matches!(ack, Ack::Ignored(IgnoredReason::UnknownSession(_))));

        let ack = api
            .process_gateway_event(GatewayEvent::Unhandled { event_type: "invoice.created".to_string() })
            .await
            .unwrap();
        assert!(matches!(ack, Ack::Ignored(IgnoredReason::UnhandledEventType(_))));
    });
}

#[test]
fn cancel_is_only_legal_while_payment_is_pending() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "judy", &dune, &emma).await;
        let api = new_order_api(db.clone(), TestGateway::new());

        let order = api.checkout(checkout_request("judy")).await.unwrap().order;
        let cancelled = api.cancel_order(&order.order_number).await.expect("Cancel failed");
        assert_eq!(cancelled.status, OrderStatusType::Cancelled);
        let dune = db.fetch_book(dune.id).await.unwrap().unwrap();
        assert_eq!(dune.stock_quantity, 10);

        let err = api.cancel_order(&order.order_number).await.expect_err("Second cancel should fail");
        assert!(matches!(err, StorefrontError::IllegalTransition { .. }));

        // A cancelled order can never be fulfilled
        let err = api.mark_fulfilled(&order.order_number).await.expect_err("Fulfil should fail");
        assert!(matches!(err, StorefrontError::IllegalTransition { .. }));
    });
}

#[test]
fn lifecycle_events_reach_topic_subscribers_in_order() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async move {
        let db = new_test_db().await;
        let (dune, emma) = seed_catalog(&db).await;
        fill_cart(&db, "kate", &dune, &emma).await;
        let api = new_order_api(db, TestGateway::new());
        let mut rx = api.broadcaster().subscribe(ADMIN_ORDER_TOPIC);

        let order = api.checkout(checkout_request("kate")).await.unwrap().order;
        let session = order.gateway_session_id.clone().unwrap();
        api.process_gateway_event(GatewayEvent::CheckoutCompleted(session)).await.unwrap();

        let first = rx.recv().await.expect("No created event");
        assert!(matches!(first, OrderLifecycleEvent::Created(_)));
        assert_eq!(first.order().order_number, order.order_number);
        let second = rx.recv().await.expect("No paid event");
        assert!(matches!(second, OrderLifecycleEvent::Paid(_)));
    });
}
