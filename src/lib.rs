// ============================================================================
// Boutique Mall - Checkout Pipeline & Order Lifecycle
// ============================================================================
//
// Multi-vendor carts are split into one order per boutique at checkout.
// Orders are event sourced; every committed event goes through the outbox
// and the relay turns it into in-app notifications.
//
// ============================================================================

pub mod api;
pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod event_sourcing;
pub mod health;
pub mod identity;
pub mod metrics;
pub mod relay;
pub mod seed;
pub mod utils;

pub use app::{MallServices, StartupError};
pub use config::MallConfig;
pub use error::MallError;
