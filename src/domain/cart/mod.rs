// ============================================================================
// Cart Domain - Multi-vendor shopping cart
// ============================================================================

pub mod errors;
pub mod service;
pub mod value_objects;

pub use errors::*;
pub use service::*;
pub use value_objects::*;
