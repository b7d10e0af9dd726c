use uuid::Uuid;

use crate::utils::IsTransient;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NotificationError {
    #[error("Notification not found: {0}")]
    NotFound(Uuid),
}

/// Failure reported by a notice sink
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeliveryError {
    #[error("Sink temporarily unavailable: {0}")]
    Transient(String),

    #[error("Notice rejected: {0}")]
    Permanent(String),
}

impl IsTransient for DeliveryError {
    fn is_transient(&self) -> bool {
        matches!(self, DeliveryError::Transient(_))
    }
}
