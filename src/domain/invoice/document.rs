use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::directory::PartyProfile;
use crate::domain::order::{DeliveryMode, OrderAggregate, OrderStatus, PaymentMethod};
use crate::domain::shared::{Money, Reference};

// ============================================================================
// Invoice Document
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvoiceError {
    #[error("Invoice unavailable for order {order_id}: order is {status}")]
    InvoiceUnavailable { order_id: Uuid, status: OrderStatus },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    pub product_id: Uuid,
    pub description: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub line_total: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub number: String,
    pub order_id: Uuid,
    pub order_reference: String,
    /// Delivery date when delivered, placement date otherwise
    pub issued_on: DateTime<Utc>,
    pub vendor: Reference<PartyProfile>,
    pub shopper: Reference<PartyProfile>,
    pub lines: Vec<InvoiceLine>,
    pub subtotal: Money,
    pub delivery_mode: DeliveryMode,
    pub delivery_fee: Money,
    pub grand_total: Money,
    pub payment_method: PaymentMethod,
}

/// Pure function of the order snapshot and the resolved parties
pub fn build_invoice(
    order: &OrderAggregate,
    vendor: Reference<PartyProfile>,
    shopper: Reference<PartyProfile>,
) -> Result<Invoice, InvoiceError> {
    if order.status.is_voided() {
        return Err(InvoiceError::InvoiceUnavailable {
            order_id: order.id,
            status: order.status,
        });
    }

    let lines = order
        .lines
        .iter()
        .map(|line| InvoiceLine {
            product_id: line.product_id,
            description: line.product_name.clone(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            line_total: line.line_total,
        })
        .collect();

    Ok(Invoice {
        number: order.reference.invoice_number(),
        order_id: order.id,
        order_reference: order.reference.to_string(),
        issued_on: order.delivered_at().unwrap_or(order.placed_at),
        vendor,
        shopper,
        lines,
        subtotal: order.subtotal,
        delivery_mode: order.delivery_mode,
        delivery_fee: order.delivery_fee,
        grand_total: order.grand_total,
        payment_method: order.payment_method,
    })
}
