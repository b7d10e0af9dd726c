use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;

use crate::error::MallError;

// ============================================================================
// Response Envelope
// ============================================================================
//
// Every JSON response is `{ success, message?, data? }`. Errors add `code`.
//
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            code: None,
            data: Some(data),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::ok(data))
}

pub fn created<T: Serialize>(data: T, message: impl Into<String>) -> HttpResponse {
    HttpResponse::Created().json(ApiResponse::ok(data).with_message(message))
}

impl ResponseError for MallError {
    fn status_code(&self) -> StatusCode {
        match self {
            MallError::Validation(_) | MallError::BusinessRule { .. } => StatusCode::BAD_REQUEST,
            MallError::NotFound(_) => StatusCode::NOT_FOUND,
            MallError::Conflict { .. } => StatusCode::CONFLICT,
            MallError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            MallError::Forbidden(_) => StatusCode::FORBIDDEN,
            MallError::Upstream(_) => StatusCode::BAD_GATEWAY,
            MallError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        }

        let data = match self {
            MallError::Conflict { conflicts, .. } => serde_json::to_value(conflicts).ok(),
            _ => None,
        };

        HttpResponse::build(status).json(ApiResponse {
            success: false,
            message: Some(self.to_string()),
            code: Some(self.code()),
            data,
        })
    }
}
