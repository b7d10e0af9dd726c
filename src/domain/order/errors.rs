use uuid::Uuid;

use crate::domain::shared::Role;
use crate::event_sourcing::EventStoreError;
use super::value_objects::{OrderStatus, PaymentStatus};

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Order already exists: {0}")]
    AlreadyExists(Uuid),

    #[error("{role} {actor_id} may not act on order {order_id}")]
    Forbidden {
        order_id: Uuid,
        actor_id: Uuid,
        role: Role,
    },

    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Invalid payment transition from {from} to {to}")]
    InvalidPaymentTransition { from: PaymentStatus, to: PaymentStatus },

    #[error("Payment cannot become {payment} while the order is {status}")]
    InvalidPaymentContext {
        status: OrderStatus,
        payment: PaymentStatus,
    },

    #[error("Order must contain at least one line")]
    EmptyLines,

    #[error("Invalid quantity for product {0}")]
    InvalidQuantity(Uuid),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Delivery address is incomplete: missing {0}")]
    IncompleteAddress(String),

    #[error("Aggregate not initialized")]
    NotInitialized,

    #[error(transparent)]
    Store(#[from] EventStoreError),
}
