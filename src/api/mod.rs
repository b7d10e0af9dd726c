// ============================================================================
// HTTP API (actix-web)
// ============================================================================
//
// Thin boundary over the domain services: authentication, JSON envelopes,
// status labels and the `MallError` → HTTP status mapping.
//
// ============================================================================

pub mod auth;
pub mod envelope;
pub mod handlers;
pub mod presentation;
pub mod routes;

#[cfg(test)]
mod tests;

pub use auth::Authenticated;
pub use envelope::ApiResponse;
pub use routes::configure_api;
