use uuid::Uuid;

use crate::domain::shared::{Money, Principal};
use super::value_objects::{
    DeliveryAddress, DeliveryMode, OrderLine, OrderReference, OrderStatus, PaymentMethod, PaymentStatus,
};

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    PlaceOrder {
        reference: OrderReference,
        order: PlaceOrder,
    },
    ChangeStatus {
        actor: Principal,
        target: OrderStatus,
        reason: Option<String>,
    },
    RecordPayment {
        actor: Principal,
        status: PaymentStatus,
    },
}

/// Issued by checkout once the vendor group's stock is reserved. The
/// reference is assigned by the command handler when the order is persisted.
#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub order_id: Uuid,
    pub shopper_id: Uuid,
    pub vendor_id: Uuid,
    pub lines: Vec<OrderLine>,
    pub delivery_mode: DeliveryMode,
    pub delivery_address: Option<DeliveryAddress>,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub delivery_fee: Money,
}
