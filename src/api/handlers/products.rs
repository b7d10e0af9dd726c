use actix_web::{web, HttpResponse};
use uuid::Uuid;

use crate::api::auth::Authenticated;
use crate::api::envelope::{created, ok};
use crate::app::MallServices;
use crate::domain::catalog::ProductDraft;
use crate::domain::inventory::ProductPatch;
use crate::error::MallError;

pub async fn create_product(
    auth: Authenticated,
    services: web::Data<MallServices>,
    body: web::Json<ProductDraft>,
) -> Result<HttpResponse, MallError> {
    let product = services.catalog.create_product(&auth.principal(), body.into_inner()).await?;
    Ok(created(product, "Produit créé"))
}

pub async fn update_product(
    auth: Authenticated,
    services: web::Data<MallServices>,
    path: web::Path<Uuid>,
    body: web::Json<ProductPatch>,
) -> Result<HttpResponse, MallError> {
    let product = services
        .catalog
        .update_product(&auth.principal(), path.into_inner(), body.into_inner())
        .await?;
    Ok(ok(product))
}
