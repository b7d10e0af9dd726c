// ============================================================================
// Statistics Domain - Read-only rollups for boutiques and administrators
// ============================================================================

pub mod aggregator;

pub use aggregator::*;
