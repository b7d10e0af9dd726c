use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::shared::Money;
use super::errors::InventoryError;

// ============================================================================
// Inventory Value Objects
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Promotion {
    /// Must stay strictly below the base price
    pub price: Money,
    pub ends_at: Option<DateTime<Utc>>,
}

impl Promotion {
    pub fn is_running_at(&self, now: DateTime<Utc>) -> bool {
        self.ends_at.map_or(true, |end| now < end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub name: String,
    pub image_url: Option<String>,
    pub price: Money,
    pub stock: u32,
    pub active: bool,
    pub promotion: Option<Promotion>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn new(vendor_id: Uuid, name: impl Into<String>, price: Money, stock: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            vendor_id,
            name: name.into(),
            image_url: None,
            price,
            stock,
            active: true,
            promotion: None,
            updated_at: Utc::now(),
        }
    }

    pub fn with_promotion(mut self, price: Money, ends_at: Option<DateTime<Utc>>) -> Self {
        self.promotion = Some(Promotion { price, ends_at });
        self
    }

    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.name.trim().is_empty() {
            return Err(InventoryError::InvalidProduct("product name is required".into()));
        }
        if self.price.is_sign_negative() {
            return Err(InventoryError::InvalidProduct(format!("negative price {}", self.price)));
        }
        if let Some(promotion) = &self.promotion {
            if promotion.price.is_sign_negative() || promotion.price >= self.price {
                return Err(InventoryError::InvalidProduct(format!(
                    "promotional price {} must be below price {}",
                    promotion.price, self.price
                )));
            }
        }
        Ok(())
    }

    pub fn is_on_promotion_at(&self, now: DateTime<Utc>) -> bool {
        self.promotion.as_ref().is_some_and(|p| p.is_running_at(now))
    }

    /// Promotional price while a promotion runs, base price otherwise
    pub fn effective_price_at(&self, now: DateTime<Utc>) -> Money {
        match &self.promotion {
            Some(promotion) if promotion.is_running_at(now) => promotion.price,
            _ => self.price,
        }
    }

    pub fn is_available(&self) -> bool {
        self.active && self.stock > 0
    }
}

/// Partial product update; `None` leaves a field untouched
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Money>,
    pub stock: Option<u32>,
    pub active: Option<bool>,
    pub promotion: Option<Promotion>,
    #[serde(default)]
    pub clear_promotion: bool,
}

impl ProductPatch {
    pub fn apply_to(&self, product: &Product) -> Product {
        let mut next = product.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(url) = &self.image_url {
            next.image_url = Some(url.clone());
        }
        if let Some(price) = self.price {
            next.price = price;
        }
        if let Some(stock) = self.stock {
            next.stock = stock;
        }
        if let Some(active) = self.active {
            next.active = active;
        }
        if self.clear_promotion {
            next.promotion = None;
        }
        if let Some(promotion) = &self.promotion {
            next.promotion = Some(promotion.clone());
        }
        next.updated_at = Utc::now();
        next
    }
}
