use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use uuid::Uuid;

use crate::app::MallServices;
use crate::domain::shared::{Principal, Role};
use crate::error::MallError;
use crate::identity::IdentityError;

// ============================================================================
// Bearer Authentication
// ============================================================================
//
// `Authorization: Bearer <token>` is resolved through the identity provider
// on every request. Handlers take `Authenticated` and narrow the role with
// the helpers below.
//
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    pub fn principal(&self) -> Principal {
        self.0
    }

    fn require(&self, role: Role) -> Result<Uuid, MallError> {
        if self.0.role == role {
            Ok(self.0.user_id)
        } else {
            Err(MallError::Forbidden(format!("Reserved to role '{role}'")))
        }
    }

    pub fn shopper_id(&self) -> Result<Uuid, MallError> {
        self.require(Role::Shopper)
    }

    pub fn vendor_id(&self) -> Result<Uuid, MallError> {
        self.require(Role::Vendor)
    }

    pub fn require_admin(&self) -> Result<(), MallError> {
        self.require(Role::Admin).map(|_| ())
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ").or_else(|| value.strip_prefix("bearer "))?;
    Some(token.trim().to_string())
}

impl FromRequest for Authenticated {
    type Error = MallError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let services = req.app_data::<web::Data<MallServices>>().cloned();
        let token = bearer_token(req);

        Box::pin(async move {
            let services =
                services.ok_or_else(|| MallError::Internal("Mall services are not configured".to_string()))?;
            let token = token.ok_or(IdentityError::MissingCredentials)?;

            match services.identity.verify(&token).await {
                Ok(principal) => Ok(Authenticated(principal)),
                Err(e) => {
                    tracing::debug!(error = %e, "Authentication rejected");
                    Err(e.into())
                }
            }
        })
    }
}
