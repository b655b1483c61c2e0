//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Handlers are generic over the storage backend and the payment gateway, so they cannot carry
//! the actix attribute macros; they are registered with concrete types in
//! [`crate::server::create_server_instance`].
use actix_web::{get, web, HttpResponse, Responder};
use bookstore_engine::{
    db_types::{NewBook, NewCoupon, OrderNumber},
    order_objects::CheckoutRequest,
    traits::{CheckoutGateway, StorefrontDatabase},
    CatalogApi,
    OrderFlowApi,
};
use bps_common::Money;
use log::*;

use crate::{
    data_objects::{CartItemParams, CheckoutResult, JsonResponse, NewBookParams, NewCouponParams, NewOrderParams},
    errors::ServerError,
};

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Orders  ----------------------------------------------------

/// `POST /api/orders`: converts the customer's cart into an order and opens a hosted checkout
/// session for it. The response carries the order and the gateway session the customer must be
/// redirected to.
pub async fn create_order<B, G>(
    body: web::Json<NewOrderParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    G: CheckoutGateway + 'static,
{
    let params = body.into_inner();
    debug!("📦️ New order request for customer {}", params.customer_id);
    let request = CheckoutRequest {
        customer_id: params.customer_id,
        coupon_code: params.coupon_code,
        shipping: params.shipping,
    };
    let checkout = api.checkout(request).await?;
    Ok(HttpResponse::Created().json(CheckoutResult::from(checkout)))
}

/// `GET /api/orders/{order_number}`
pub async fn order_by_number<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    G: CheckoutGateway + 'static,
{
    let order_number = OrderNumber::from(path.into_inner());
    let order = api
        .fetch_order(&order_number)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Order {order_number} does not exist")))?;
    Ok(HttpResponse::Ok().json(order))
}

/// `POST /api/orders/{order_number}/cancel`
pub async fn cancel_order<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    G: CheckoutGateway + 'static,
{
    let order_number = OrderNumber::from(path.into_inner());
    let order = api.cancel_order(&order_number).await?;
    Ok(HttpResponse::Ok().json(order))
}

/// `POST /api/orders/{order_number}/fulfill`
pub async fn fulfill_order<B, G>(
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: StorefrontDatabase + 'static,
    G: CheckoutGateway + 'static,
{
    let order_number = OrderNumber::from(path.into_inner());
    let order = api.mark_fulfilled(&order_number).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Cart  ----------------------------------------------------

/// `POST /api/cart/items`: adds a line to (or replaces the quantity in) the customer's cart.
pub async fn add_cart_item<B>(
    body: web::Json<CartItemParams>,
    db: web::Data<B>,
) -> Result<HttpResponse, ServerError>
where B: StorefrontDatabase + 'static {
    let params = body.into_inner();
    db.upsert_cart_item(&params.customer_id, params.book_id, params.quantity).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Cart updated.")))
}

//----------------------------------------------   Catalog  ----------------------------------------------------

/// `POST /api/books`
pub async fn add_book<B>(body: web::Json<NewBookParams>, api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError>
where B: StorefrontDatabase + 'static {
    let params = body.into_inner();
    if params.price < 0 || params.stock_quantity < 0 {
        return Err(ServerError::InvalidRequestBody("Price and stock must be non-negative".to_string()));
    }
    let mut book = NewBook::new(params.title, Money::from_cents(params.price), params.stock_quantity);
    if let Some(author) = params.author {
        book = book.by(author);
    }
    let book = api.add_book(book).await?;
    Ok(HttpResponse::Created().json(book))
}

/// `GET /api/books/{id}`: live books only. Tombstoned books 404 here.
pub async fn book_by_id<B>(path: web::Path<i64>, api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError>
where B: StorefrontDatabase + 'static {
    let book_id = path.into_inner();
    let book = api
        .fetch_book(book_id)
        .await?
        .ok_or_else(|| ServerError::NoRecordFound(format!("Book #{book_id} does not exist")))?;
    Ok(HttpResponse::Ok().json(book))
}

/// `DELETE /api/books/{id}`: soft delete. The book can be restored until the purge worker
/// removes it for good.
pub async fn delete_book<B>(path: web::Path<i64>, api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError>
where B: StorefrontDatabase + 'static {
    let book_id = path.into_inner();
    if api.soft_delete_book(book_id).await? {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Book #{book_id} deleted."))))
    } else {
        Err(ServerError::NoRecordFound(format!("Book #{book_id} does not exist or is already deleted")))
    }
}

/// `POST /api/books/{id}/restore`
pub async fn restore_book<B>(path: web::Path<i64>, api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError>
where B: StorefrontDatabase + 'static {
    let book_id = path.into_inner();
    if api.restore_book(book_id).await? {
        Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Book #{book_id} restored."))))
    } else {
        Err(ServerError::NoRecordFound(format!("Book #{book_id} has no tombstone to restore")))
    }
}

/// `POST /api/coupons`
pub async fn add_coupon<B>(
    body: web::Json<NewCouponParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError>
where B: StorefrontDatabase + 'static {
    let params = body.into_inner();
    let coupon = match (params.percent_off, params.amount_off) {
        (Some(pct), None) => {
            if !(0..=100).contains(&pct) {
                return Err(ServerError::InvalidRequestBody("percent_off must be between 0 and 100".to_string()));
            }
            NewCoupon::percent(params.code, pct)
        },
        (None, Some(cents)) => {
            if cents < 0 {
                return Err(ServerError::InvalidRequestBody("amount_off must be non-negative".to_string()));
            }
            NewCoupon::fixed(params.code, Money::from_cents(cents))
        },
        _ => {
            return Err(ServerError::InvalidRequestBody(
                "Exactly one of percent_off and amount_off must be given".to_string(),
            ));
        },
    };
    let coupon = api.add_coupon(coupon).await?;
    Ok(HttpResponse::Created().json(coupon))
}
