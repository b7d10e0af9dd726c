use crate::domain::cart::CartError;
use crate::domain::catalog::CatalogError;
use crate::domain::checkout::{CheckoutError, StockConflictLine};
use crate::domain::inventory::InventoryError;
use crate::domain::invoice::InvoiceError;
use crate::domain::notification::NotificationError;
use crate::domain::order::OrderError;
use crate::event_sourcing::store::EventStoreError;
use crate::identity::IdentityError;

// ============================================================================
// Mall Error Taxonomy
// ============================================================================
//
// Every component error folds into one of these at the HTTP boundary.
// Business-rule failures keep a stable machine-readable code.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum MallError {
    #[error("{0}")]
    Validation(String),

    #[error("{message}")]
    BusinessRule { code: &'static str, message: String },

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict {
        message: String,
        conflicts: Vec<StockConflictLine>,
    },

    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Upstream(String),

    #[error("{0}")]
    Internal(String),
}

impl MallError {
    pub fn rule(code: &'static str, message: impl Into<String>) -> Self {
        MallError::BusinessRule {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MallError::Validation(_) => "VALIDATION_ERROR",
            MallError::BusinessRule { code, .. } => *code,
            MallError::NotFound(_) => "NOT_FOUND",
            MallError::Conflict { .. } => "STOCK_CONFLICT",
            MallError::Unauthenticated(_) => "UNAUTHENTICATED",
            MallError::Forbidden(_) => "FORBIDDEN",
            MallError::Upstream(_) => "UPSTREAM_ERROR",
            MallError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<InventoryError> for MallError {
    fn from(e: InventoryError) -> Self {
        match e {
            InventoryError::ProductNotFound(_) => MallError::NotFound(e.to_string()),
            InventoryError::InsufficientStock { .. } => MallError::rule("INSUFFICIENT_STOCK", e.to_string()),
            InventoryError::ProductInactive(_) => MallError::rule("PRODUCT_UNAVAILABLE", e.to_string()),
            InventoryError::InvalidQuantity => MallError::rule("INVALID_QUANTITY", e.to_string()),
            InventoryError::InvalidProduct(_) => MallError::Validation(e.to_string()),
            InventoryError::DuplicateProduct(_) => MallError::Validation(e.to_string()),
        }
    }
}

impl From<CartError> for MallError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::InvalidQuantity(_) => MallError::rule("INVALID_QUANTITY", e.to_string()),
            CartError::ProductUnavailable(_) => MallError::rule("PRODUCT_UNAVAILABLE", e.to_string()),
            CartError::ProductNotFound(_) | CartError::LineNotFound(_) => MallError::NotFound(e.to_string()),
        }
    }
}

impl From<EventStoreError> for MallError {
    fn from(e: EventStoreError) -> Self {
        match e {
            EventStoreError::AggregateNotFound(_) => MallError::NotFound(e.to_string()),
            other => MallError::Internal(other.to_string()),
        }
    }
}

impl From<OrderError> for MallError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(_) => MallError::NotFound(e.to_string()),
            OrderError::Forbidden { .. } => MallError::Forbidden(e.to_string()),
            OrderError::InvalidTransition { .. } => MallError::rule("INVALID_TRANSITION", e.to_string()),
            OrderError::InvalidPaymentTransition { .. } => {
                MallError::rule("INVALID_PAYMENT_TRANSITION", e.to_string())
            }
            OrderError::InvalidPaymentContext { .. } => MallError::rule("INVALID_PAYMENT_CONTEXT", e.to_string()),
            OrderError::InvalidQuantity(_) => MallError::rule("INVALID_QUANTITY", e.to_string()),
            OrderError::EmptyLines | OrderError::InvalidAmount(_) | OrderError::IncompleteAddress(_) => {
                MallError::Validation(e.to_string())
            }
            OrderError::Store(store) => store.into(),
            OrderError::AlreadyExists(_) | OrderError::NotInitialized => MallError::Internal(e.to_string()),
        }
    }
}

impl From<CheckoutError> for MallError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::EmptyCart => MallError::rule("EMPTY_CART", e.to_string()),
            CheckoutError::Validation(message) => MallError::Validation(message),
            CheckoutError::StockConflict(conflicts) => MallError::Conflict {
                message: format!("Stock conflict on {} line(s)", conflicts.len()),
                conflicts,
            },
            CheckoutError::Order(order) => order.into(),
        }
    }
}

impl From<InvoiceError> for MallError {
    fn from(e: InvoiceError) -> Self {
        MallError::rule("INVOICE_UNAVAILABLE", e.to_string())
    }
}

impl From<NotificationError> for MallError {
    fn from(e: NotificationError) -> Self {
        MallError::NotFound(e.to_string())
    }
}

impl From<CatalogError> for MallError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotAVendor | CatalogError::NotOwner { .. } => MallError::Forbidden(e.to_string()),
            CatalogError::Inventory(inner) => inner.into(),
        }
    }
}

impl From<IdentityError> for MallError {
    fn from(e: IdentityError) -> Self {
        match e {
            IdentityError::MissingCredentials | IdentityError::InvalidToken => {
                MallError::Unauthenticated(e.to_string())
            }
            IdentityError::Unavailable(_) => MallError::Upstream(e.to_string()),
            IdentityError::InvalidConfig(_) => MallError::Internal(e.to_string()),
        }
    }
}
