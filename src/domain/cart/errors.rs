use uuid::Uuid;

// ============================================================================
// Cart Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CartError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(i64),

    #[error("Product is unavailable: {0}")]
    ProductUnavailable(Uuid),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Product {0} is not in the cart")]
    LineNotFound(Uuid),
}
