use actix_web::{web, HttpResponse};

use crate::api::auth::Authenticated;
use crate::api::envelope::ApiResponse;
use crate::app::MallServices;
use crate::domain::checkout::CheckoutRequest;
use crate::error::MallError;

pub async fn checkout(
    auth: Authenticated,
    services: web::Data<MallServices>,
    body: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, MallError> {
    let shopper_id = auth.shopper_id()?;
    let outcome = services.checkout.checkout(shopper_id, body.into_inner()).await?;

    let message = if outcome.is_partial() {
        format!(
            "{} commande(s) créée(s), {} boutique(s) en échec",
            outcome.orders.len(),
            outcome.failed_groups.len()
        )
    } else {
        format!("{} commande(s) créée(s)", outcome.orders.len())
    };

    Ok(HttpResponse::Created().json(ApiResponse::ok(outcome).with_message(message)))
}
