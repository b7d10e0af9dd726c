// ============================================================================
// Checkout Domain - Multi-vendor cart to vendor-scoped orders
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod orchestrator;

pub use value_objects::*;
pub use errors::*;
pub use orchestrator::*;
