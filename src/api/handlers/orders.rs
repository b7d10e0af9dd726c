use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::auth::Authenticated;
use crate::api::envelope::{ok, ApiResponse};
use crate::api::presentation::OrderView;
use crate::app::MallServices;
use crate::domain::invoice::render_invoice;
use crate::domain::order::{OrderAggregate, OrderStatus, PaymentStatus};
use crate::domain::shared::Role;
use crate::error::MallError;

#[derive(Debug, Deserialize)]
pub struct StatusBody {
    pub status: OrderStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    pub payment_status: PaymentStatus,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Load an order the caller may see
async fn visible_order(services: &MallServices, auth: &Authenticated, order_id: Uuid) -> Result<OrderAggregate, MallError> {
    let order = services.orders.order(order_id).await?;
    if order.is_visible_to(&auth.principal()) {
        Ok(order)
    } else {
        Err(MallError::Forbidden(format!("Order {order_id} is not yours")))
    }
}

pub async fn list_orders(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    let principal = auth.principal();
    let mut orders = match principal.role {
        Role::Admin => services.orders.all_orders().await?,
        Role::Shopper => services.orders.orders_for_shopper(principal.user_id).await?,
        Role::Vendor => services.orders.orders_for_vendor(principal.user_id).await?,
    };
    orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at));

    let views: Vec<OrderView> = orders.into_iter().map(OrderView::from).collect();
    Ok(ok(views))
}

pub async fn get_order(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, MallError> {
    let order = visible_order(&services, &auth, path.into_inner()).await?;
    Ok(ok(OrderView::from(order)))
}

pub async fn order_history(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, MallError> {
    let order = visible_order(&services, &auth, path.into_inner()).await?;
    Ok(ok(order.history))
}

pub async fn change_status(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
    body: web::Json<StatusBody>,
) -> Result<HttpResponse, MallError> {
    let StatusBody { status, reason } = body.into_inner();
    let order = services
        .orders
        .transition(path.into_inner(), auth.principal(), status, reason)
        .await?;

    let view = OrderView::from(order);
    let message = format!("Commande {} : {}", view.order.reference.as_str(), view.status_label.label);
    Ok(HttpResponse::Ok().json(ApiResponse::ok(view).with_message(message)))
}

pub async fn record_payment(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
    body: web::Json<PaymentBody>,
) -> Result<HttpResponse, MallError> {
    let order = services
        .orders
        .record_payment(path.into_inner(), auth.principal(), body.payment_status)
        .await?;
    Ok(ok(OrderView::from(order)))
}

/// Plain-text attachment by default, JSON with `?format=json`
pub async fn invoice(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
    query: web::Query<InvoiceQuery>,
) -> Result<HttpResponse, MallError> {
    let order = visible_order(&services, &auth, path.into_inner()).await?;
    let invoice = services.invoices.invoice_for(&order).await?;

    if query.format.as_deref() == Some("json") {
        return Ok(ok(invoice));
    }

    let disposition = ContentDisposition {
        disposition: DispositionType::Attachment,
        parameters: vec![DispositionParam::Filename(format!("{}.txt", invoice.number))],
    };

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .insert_header(disposition)
        .body(render_invoice(&invoice)))
}
