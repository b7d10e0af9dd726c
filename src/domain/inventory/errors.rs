use uuid::Uuid;

// ============================================================================
// Inventory Errors
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InventoryError {
    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: u32,
        available: u32,
    },

    #[error("Product is not active: {0}")]
    ProductInactive(Uuid),

    #[error("Quantity must be at least 1")]
    InvalidQuantity,

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Product already exists: {0}")]
    DuplicateProduct(Uuid),
}
