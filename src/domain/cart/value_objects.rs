use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::Money;

// ============================================================================
// Cart Value Objects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartElement {
    pub product_id: Uuid,
    pub quantity: u32,
    pub added_at: DateTime<Utc>,
}

/// A shopper's cart; lines keep insertion order for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub shopper_id: Uuid,
    pub elements: Vec<CartElement>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(shopper_id: Uuid) -> Self {
        Self {
            shopper_id,
            elements: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn line(&self, product_id: Uuid) -> Option<&CartElement> {
        self.elements.iter().find(|e| e.product_id == product_id)
    }

    pub fn contains(&self, product_id: Uuid) -> bool {
        self.line(product_id).is_some()
    }

    /// Set the quantity of a line, creating it when absent
    pub(crate) fn upsert(&mut self, product_id: Uuid, quantity: u32) {
        let now = Utc::now();
        match self.elements.iter_mut().find(|e| e.product_id == product_id) {
            Some(element) => element.quantity = quantity,
            None => self.elements.push(CartElement {
                product_id,
                quantity,
                added_at: now,
            }),
        }
        self.updated_at = now;
    }

    /// Returns false when the line was not there
    pub(crate) fn remove(&mut self, product_id: Uuid) -> bool {
        let before = self.elements.len();
        self.elements.retain(|e| e.product_id != product_id);
        self.updated_at = Utc::now();
        self.elements.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.elements.clear();
        self.updated_at = Utc::now();
    }
}

/// What actually landed in the cart after an add or update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineAdjustment {
    pub product_id: Uuid,
    pub requested: u32,
    pub quantity: u32,
    /// True when the quantity was capped at available stock
    pub clamped: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineView {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub on_promotion: bool,
    pub line_total: Money,
    pub available_stock: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorSubtotal {
    pub vendor_id: Uuid,
    pub lines: Vec<CartLineView>,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnavailableLine {
    pub product_id: Uuid,
    pub quantity: u32,
    pub reason: String,
}

/// Totals snapshot, re-derived from live prices on every call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub shopper_id: Uuid,
    pub vendors: Vec<VendorSubtotal>,
    pub unavailable: Vec<UnavailableLine>,
    pub item_count: u32,
    pub grand_total: Money,
    pub computed_at: DateTime<Utc>,
}
