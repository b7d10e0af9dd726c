use actix_web::web;

use super::handlers::{cart, checkout, notifications, orders, products, stats};
use crate::error::MallError;

// ============================================================================
// API Routes
// ============================================================================
//
// Everything lives under `/api`. Every handler authenticates through the
// `Authenticated` extractor; role checks happen inside the handlers or the
// domain services. Extractor rejections (bad JSON, unknown enum values,
// malformed ids) answer with the same envelope as domain validation errors.
//
// ============================================================================

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| MallError::Validation(err.to_string()).into())
}

fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|err, _req| MallError::Validation(err.to_string()).into())
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| MallError::Validation(err.to_string()).into())
}

pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .app_data(json_config())
            .app_data(path_config())
            .app_data(query_config())
            .service(
                web::scope("/cart")
                    .route("", web::get().to(cart::get_cart))
                    .route("", web::delete().to(cart::clear_cart))
                    .route("/items", web::post().to(cart::add_item))
                    .route("/items/{product_id}", web::patch().to(cart::update_item))
                    .route("/items/{product_id}", web::delete().to(cart::remove_item)),
            )
            .route("/checkout", web::post().to(checkout::checkout))
            .service(
                web::scope("/orders")
                    .route("", web::get().to(orders::list_orders))
                    .route("/{id}", web::get().to(orders::get_order))
                    .route("/{id}/history", web::get().to(orders::order_history))
                    .route("/{id}/status", web::patch().to(orders::change_status))
                    .route("/{id}/payment", web::patch().to(orders::record_payment))
                    .route("/{id}/invoice", web::get().to(orders::invoice)),
            )
            .service(
                web::scope("/notifications")
                    .route("", web::get().to(notifications::list))
                    .route("/unread-count", web::get().to(notifications::unread_count))
                    .route("/read-all", web::patch().to(notifications::mark_all_read))
                    .route("/{id}/read", web::patch().to(notifications::mark_read)),
            )
            .service(
                web::scope("/products")
                    .route("", web::post().to(products::create_product))
                    .route("/{id}", web::patch().to(products::update_product)),
            )
            .service(
                web::scope("/stats")
                    .route("/vendor", web::get().to(stats::own_vendor_stats))
                    .route("/vendor/{id}", web::get().to(stats::vendor_stats))
                    .route("/global", web::get().to(stats::global_stats)),
            ),
    );
}
