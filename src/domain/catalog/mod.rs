// ============================================================================
// Catalog Domain - Boutique-owned product management
// ============================================================================

pub mod service;

pub use service::*;
