use actix_web::http::{header, StatusCode};
use actix_web::{test, web, App};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::app::MallServices;
use crate::config::MallConfig;
use crate::domain::catalog::ProductDraft;
use crate::domain::inventory::Product;
use crate::domain::shared::Principal;
use crate::identity::StaticTokenIdentity;
use crate::metrics::configure_observability;
use super::configure_api;

// ============================================================================
// HTTP Tests
// ============================================================================

struct Fixture {
    services: web::Data<MallServices>,
    shopper: Uuid,
    vendor: Uuid,
}

fn fixture() -> Fixture {
    let shopper = Uuid::new_v4();
    let vendor = Uuid::new_v4();
    let identity = StaticTokenIdentity::new()
        .with_token("shopper-token", Principal::shopper(shopper))
        .with_token("vendor-token", Principal::vendor(vendor))
        .with_token("rival-token", Principal::vendor(Uuid::new_v4()))
        .with_token("admin-token", Principal::admin(Uuid::new_v4()));

    let services = MallServices::with_identity(&MallConfig::default(), Arc::new(identity)).unwrap();
    Fixture {
        services: web::Data::new(services),
        shopper,
        vendor,
    }
}

impl Fixture {
    async fn product(&self, price: i64, stock: u32) -> Product {
        let draft = ProductDraft {
            name: "Pagne kente".to_string(),
            image_url: None,
            price: Decimal::new(price, 0),
            stock,
            promotion: None,
        };
        self.services
            .catalog
            .create_product(&Principal::vendor(self.vendor), draft)
            .await
            .unwrap()
    }
}

macro_rules! app {
    ($fx:expr) => {
        test::init_service(
            App::new()
                .app_data($fx.services.clone())
                .app_data(web::Data::new($fx.services.metrics.clone()))
                .app_data(web::Data::new($fx.services.health.clone()))
                .configure(configure_api)
                .configure(configure_observability),
        )
        .await
    };
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn pickup_checkout() -> Value {
    json!({ "deliveryMode": "retrait_boutique", "paymentMethod": "especes" })
}

#[actix_web::test]
async fn missing_token_is_unauthorized() {
    let fx = fixture();
    let app = app!(fx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/cart").to_request()).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHENTICATED");

    let req = test::TestRequest::get()
        .uri("/api/cart")
        .insert_header(bearer("nobody"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn roles_are_enforced() {
    let fx = fixture();
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/stats/global")
        .insert_header(bearer("shopper-token"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/cart")
        .insert_header(bearer("vendor-token"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/stats/global")
        .insert_header(bearer("admin-token"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
}

#[actix_web::test]
async fn vendor_creates_and_rival_cannot_edit() {
    let fx = fixture();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer("vendor-token"))
        .set_json(json!({ "name": "Nappe brodée", "price": "42.00", "stock": 8 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let product_id = body["data"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/products/{product_id}"))
        .insert_header(bearer("rival-token"))
        .set_json(json!({ "stock": 0 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .insert_header(bearer("shopper-token"))
        .set_json(json!({ "name": "Contrefaçon", "price": "1.00", "stock": 1 }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cart_merge_clamps_to_stock() {
    let fx = fixture();
    let product = fx.product(20, 10).await;
    let app = app!(fx);

    for quantity in [8, 5] {
        let req = test::TestRequest::post()
            .uri("/api/cart/items")
            .insert_header(bearer("shopper-token"))
            .set_json(json!({ "productId": product.id, "quantity": quantity }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let cart = fx.services.carts.cart(fx.shopper).await;
    assert_eq!(cart.elements[0].quantity, 10);

    let req = test::TestRequest::post()
        .uri("/api/cart/items")
        .insert_header(bearer("shopper-token"))
        .set_json(json!({ "productId": product.id, "quantity": 0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVALID_QUANTITY");
}

#[actix_web::test]
async fn empty_cart_checkout_is_rejected() {
    let fx = fixture();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header(bearer("shopper-token"))
        .set_json(pickup_checkout())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "EMPTY_CART");
}

#[actix_web::test]
async fn unknown_delivery_mode_gets_the_error_envelope() {
    let fx = fixture();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header(bearer("shopper-token"))
        .set_json(json!({ "deliveryMode": "teleportation", "paymentMethod": "especes" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().is_some_and(|m| m.contains("teleportation")));
}

#[actix_web::test]
async fn malformed_order_id_gets_the_error_envelope() {
    let fx = fixture();
    let app = app!(fx);

    let req = test::TestRequest::get()
        .uri("/api/orders/pas-un-uuid")
        .insert_header(bearer("shopper-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn stock_conflict_is_409_with_offending_lines() {
    let fx = fixture();
    let product = fx.product(15, 1).await;
    fx.services.carts.add_item(fx.shopper, product.id, 1).await.unwrap();
    fx.services.ledger.reserve_and_decrement(product.id, 1).await.unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header(bearer("shopper-token"))
        .set_json(pickup_checkout())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "STOCK_CONFLICT");
    assert_eq!(body["data"][0]["productId"], product.id.to_string());
    assert_eq!(body["data"][0]["reason"], "insufficient_stock");
}

#[actix_web::test]
async fn order_lifecycle_over_http() {
    let fx = fixture();
    let product = fx.product(20, 5).await;
    fx.services.carts.add_item(fx.shopper, product.id, 2).await.unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header(bearer("shopper-token"))
        .set_json(pickup_checkout())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let order_id = body["data"]["orders"][0]["id"].as_str().unwrap().to_string();
    assert_eq!(fx.services.ledger.product(product.id).await.unwrap().stock, 3);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{order_id}"))
        .insert_header(bearer("shopper-token"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "en_attente");
    assert_eq!(body["data"]["statusLabel"]["label"], "En attente");

    // shoppers only cancel
    let req = test::TestRequest::patch()
        .uri(&format!("/api/orders/{order_id}/status"))
        .insert_header(bearer("shopper-token"))
        .set_json(json!({ "status": "en_preparation" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    for status in ["en_preparation", "pret"] {
        let req = test::TestRequest::patch()
            .uri(&format!("/api/orders/{order_id}/status"))
            .insert_header(bearer("vendor-token"))
            .set_json(json!({ "status": status }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::patch()
        .uri(&format!("/api/orders/{order_id}/payment"))
        .insert_header(bearer("vendor-token"))
        .set_json(json!({ "paymentStatus": "paye" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["paymentStatus"], "paye");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/orders/{order_id}/status"))
        .insert_header(bearer("vendor-token"))
        .set_json(json!({ "status": "livre" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{order_id}/invoice"))
        .insert_header(bearer("shopper-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .unwrap()
        .to_string();
    assert!(disposition.contains("FAC-"));
    let text = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&text).starts_with("FACTURE FAC-"));

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{order_id}/history"))
        .insert_header(bearer("admin-token"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 4);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{order_id}"))
        .insert_header(bearer("rival-token"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn cancelled_order_has_no_invoice() {
    let fx = fixture();
    let product = fx.product(20, 5).await;
    fx.services.carts.add_item(fx.shopper, product.id, 1).await.unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header(bearer("shopper-token"))
        .set_json(pickup_checkout())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let order_id = body["data"]["orders"][0]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/orders/{order_id}/status"))
        .insert_header(bearer("shopper-token"))
        .set_json(json!({ "status": "annule", "reason": "Changement d'avis" }))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/orders/{order_id}/invoice"))
        .insert_header(bearer("shopper-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["code"], "INVOICE_UNAVAILABLE");
}

#[actix_web::test]
async fn notifications_flow_through_the_relay() {
    let fx = fixture();
    let product = fx.product(20, 5).await;
    fx.services.carts.add_item(fx.shopper, product.id, 1).await.unwrap();
    let app = app!(fx);

    let req = test::TestRequest::post()
        .uri("/api/checkout")
        .insert_header(bearer("shopper-token"))
        .set_json(pickup_checkout())
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

    fx.services.relay.relay_pending().await;

    let req = test::TestRequest::get()
        .uri("/api/notifications/unread-count")
        .insert_header(bearer("vendor-token"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["count"], 1);

    let req = test::TestRequest::get()
        .uri("/api/notifications")
        .insert_header(bearer("shopper-token"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let notification_id = body["data"][0]["id"].as_str().unwrap().to_string();

    // someone else's notification looks missing
    let req = test::TestRequest::patch()
        .uri(&format!("/api/notifications/{notification_id}/read"))
        .insert_header(bearer("vendor-token"))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::patch()
        .uri("/api/notifications/read-all")
        .insert_header(bearer("shopper-token"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["updated"], 1);
    assert_eq!(fx.services.notifications.count_unread(fx.shopper).await, 0);
}

#[actix_web::test]
async fn observability_endpoints() {
    let fx = fixture();
    let app = app!(fx);

    let resp = test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["overallStatus"]["state"], "healthy");

    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let text = test::read_body(resp).await;
    assert!(String::from_utf8_lossy(&text).contains("circuit_breaker_state"));
}
