// ============================================================================
// Identity Boundary - Bearer tokens to principals
// ============================================================================

pub mod provider;
pub mod guarded;

pub use provider::*;
pub use guarded::*;
