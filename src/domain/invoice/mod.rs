// ============================================================================
// Invoice Domain - Documents derived from delivered orders
// ============================================================================

pub mod document;
pub mod render;
pub mod service;

pub use document::*;
pub use render::*;
pub use service::*;
