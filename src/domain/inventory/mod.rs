// ============================================================================
// Inventory Domain - Products, stock and prices
// ============================================================================

pub mod errors;
pub mod ledger;
pub mod value_objects;

pub use errors::*;
pub use ledger::*;
pub use value_objects::*;
