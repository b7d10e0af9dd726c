use crate::domain::order::OrderError;
use super::value_objects::StockConflictLine;

// ============================================================================
// Checkout Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Invalid checkout request: {0}")]
    Validation(String),

    #[error("Stock conflict on {} line(s)", .0.len())]
    StockConflict(Vec<StockConflictLine>),

    #[error(transparent)]
    Order(#[from] OrderError),
}
