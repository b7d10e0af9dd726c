use actix_web::{web, HttpResponse};
use serde::Serialize;
use uuid::Uuid;

use crate::api::auth::Authenticated;
use crate::api::envelope::{ok, ApiResponse};
use crate::app::MallServices;
use crate::error::MallError;

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct MarkedCount {
    pub updated: usize,
}

pub async fn list(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    let recipient = auth.principal().user_id;
    Ok(ok(services.notifications.list(recipient).await))
}

pub async fn unread_count(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    let count = services.notifications.count_unread(auth.principal().user_id).await;
    Ok(ok(UnreadCount { count }))
}

pub async fn mark_read(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, MallError> {
    let notification = services
        .notifications
        .mark_read(auth.principal().user_id, path.into_inner())
        .await?;
    Ok(ok(notification))
}

pub async fn mark_all_read(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    let updated = services.notifications.mark_all_read(auth.principal().user_id).await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok(MarkedCount { updated }).with_message("Notifications marquées comme lues")))
}
