use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{OrderStatus, PaymentStatus};
use crate::domain::shared::{Money, Role};
use super::errors::DeliveryError;

// ============================================================================
// Domain Notices - What the relay hands to notification sinks
// ============================================================================
//
// Order events enriched with the parties and the reference, so sinks never
// have to read the order stream themselves.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainNotice {
    #[serde(rename_all = "camelCase")]
    OrderCreated {
        event_id: Uuid,
        order_id: Uuid,
        reference: String,
        shopper_id: Uuid,
        vendor_id: Uuid,
        grand_total: Money,
    },
    #[serde(rename_all = "camelCase")]
    OrderStatusChanged {
        event_id: Uuid,
        order_id: Uuid,
        reference: String,
        shopper_id: Uuid,
        vendor_id: Uuid,
        from: OrderStatus,
        to: OrderStatus,
        actor_role: Role,
        reason: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    PaymentStatusChanged {
        event_id: Uuid,
        order_id: Uuid,
        reference: String,
        shopper_id: Uuid,
        vendor_id: Uuid,
        to: PaymentStatus,
    },
}

impl DomainNotice {
    pub fn event_id(&self) -> Uuid {
        match self {
            DomainNotice::OrderCreated { event_id, .. }
            | DomainNotice::OrderStatusChanged { event_id, .. }
            | DomainNotice::PaymentStatusChanged { event_id, .. } => *event_id,
        }
    }

    pub fn order_id(&self) -> Uuid {
        match self {
            DomainNotice::OrderCreated { order_id, .. }
            | DomainNotice::OrderStatusChanged { order_id, .. }
            | DomainNotice::PaymentStatusChanged { order_id, .. } => *order_id,
        }
    }
}

/// Consumer of domain notices; `Ok` carries how many records were created
#[async_trait]
pub trait NoticeSink: Send + Sync {
    async fn deliver(&self, notice: &DomainNotice) -> Result<usize, DeliveryError>;
}
