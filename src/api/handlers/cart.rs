use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::Authenticated;
use crate::api::envelope::{ok, ApiResponse};
use crate::app::MallServices;
use crate::domain::cart::{CartLineAdjustment, CartTotals};
use crate::error::MallError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub product_id: Uuid,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct QuantityBody {
    pub quantity: i64,
}

/// Cart state after a mutation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMutation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub adjustment: Option<CartLineAdjustment>,
    pub cart: CartTotals,
}

fn adjusted(adjustment: Option<CartLineAdjustment>, cart: CartTotals) -> HttpResponse {
    let message = match &adjustment {
        Some(a) if a.clamped => Some(format!("Quantité limitée au stock disponible ({})", a.quantity)),
        Some(_) => None,
        None => Some("Article retiré du panier".to_string()),
    };

    let mut body = ApiResponse::ok(CartMutation { adjustment, cart });
    body.message = message;
    HttpResponse::Ok().json(body)
}

pub async fn get_cart(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    let shopper_id = auth.shopper_id()?;
    Ok(ok(services.carts.compute_totals(shopper_id).await))
}

pub async fn add_item(
    auth: Authenticated,
    services: web::Data<MallServices>,
    body: web::Json<AddItemBody>,
) -> Result<HttpResponse, MallError> {
    let shopper_id = auth.shopper_id()?;
    let adjustment = services.carts.add_item(shopper_id, body.product_id, body.quantity).await?;
    let cart = services.carts.compute_totals(shopper_id).await;
    Ok(adjusted(Some(adjustment), cart))
}

pub async fn update_item(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
    body: web::Json<QuantityBody>,
) -> Result<HttpResponse, MallError> {
    let shopper_id = auth.shopper_id()?;
    let adjustment = services
        .carts
        .update_quantity(shopper_id, path.into_inner(), body.quantity)
        .await?;
    let cart = services.carts.compute_totals(shopper_id).await;
    Ok(adjusted(adjustment, cart))
}

pub async fn remove_item(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, MallError> {
    let shopper_id = auth.shopper_id()?;
    services.carts.remove_item(shopper_id, path.into_inner()).await?;
    let cart = services.carts.compute_totals(shopper_id).await;
    Ok(adjusted(None, cart))
}

pub async fn clear_cart(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    let shopper_id = auth.shopper_id()?;
    services.carts.clear(shopper_id).await;
    let cart = services.carts.compute_totals(shopper_id).await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(cart).with_message("Panier vidé")))
}
