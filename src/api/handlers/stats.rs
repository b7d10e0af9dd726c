use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::api::auth::Authenticated;
use crate::api::envelope::ok;
use crate::app::MallServices;
use crate::error::MallError;

pub async fn own_vendor_stats(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    let vendor_id = auth.vendor_id()?;
    Ok(ok(services.statistics.vendor_stats(vendor_id).await?))
}

pub async fn vendor_stats(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, MallError> {
    auth.require_admin()?;
    Ok(ok(services.statistics.vendor_stats(path.into_inner()).await?))
}

pub async fn global_stats(auth: Authenticated, services: web::Data<MallServices>) -> Result<HttpResponse, MallError> {
    auth.require_admin()?;
    Ok(ok(services.statistics.global_stats().await?))
}
