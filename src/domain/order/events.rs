use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::{Money, Role};
use crate::event_sourcing::core::DomainEvent;
use super::value_objects::{
    DeliveryAddress, DeliveryMode, OrderLine, OrderReference, OrderStatus, PaymentMethod, PaymentStatus,
};

// ============================================================================
// Order Events - Domain Events for Order Aggregate
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum OrderEvent {
    Created(OrderCreated),
    StatusChanged(OrderStatusChanged),
    PaymentStatusChanged(PaymentStatusChanged),
}

impl DomainEvent for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::Created(_) => "OrderCreated",
            OrderEvent::StatusChanged(_) => "OrderStatusChanged",
            OrderEvent::PaymentStatusChanged(_) => "PaymentStatusChanged",
        }
    }
}

// ============================================================================
// Individual Event Types
// ============================================================================

/// Order Created - one vendor's share of a checkout, prices frozen
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreated {
    pub order_id: Uuid,
    pub reference: OrderReference,
    pub shopper_id: Uuid,
    pub vendor_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub delivery_mode: DeliveryMode,
    pub delivery_address: Option<DeliveryAddress>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub subtotal: Money,
    pub delivery_fee: Money,
    pub grand_total: Money,
    pub placed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChanged {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor_role: Role,
    pub actor_id: Uuid,
    pub reason: Option<String>,
    pub changed_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusChanged {
    pub from: PaymentStatus,
    pub to: PaymentStatus,
    pub actor_role: Role,
    pub actor_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}
