use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::order::{DeliveryAddress, DeliveryFees, DeliveryMode, OrderAggregate, PaymentMethod};

// ============================================================================
// Checkout Value Objects
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub delivery_mode: DeliveryMode,
    #[serde(default)]
    pub delivery_address: Option<DeliveryAddress>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictReason {
    NotFound,
    Inactive,
    InsufficientStock,
}

/// A cart line that cannot be satisfied by live stock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockConflictLine {
    pub product_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub requested: u32,
    pub available: u32,
    pub reason: ConflictReason,
}

/// Vendor group rolled back at commit time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedVendorGroup {
    pub vendor_id: Uuid,
    pub product_id: Option<Uuid>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    pub correlation_id: Uuid,
    pub orders: Vec<OrderAggregate>,
    pub failed_groups: Vec<FailedVendorGroup>,
}

impl CheckoutOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failed_groups.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct CheckoutSettings {
    pub fees: DeliveryFees,
    /// Remaining stock at or below this triggers a vendor notice
    pub low_stock_threshold: u32,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            fees: DeliveryFees::default(),
            low_stock_threshold: 3,
        }
    }
}
