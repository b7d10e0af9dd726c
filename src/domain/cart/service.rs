use chrono::Utc;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::inventory::InventoryLedger;
use super::errors::CartError;
use super::value_objects::{
    Cart, CartLineAdjustment, CartLineView, CartTotals, UnavailableLine, VendorSubtotal,
};

// ============================================================================
// Cart Aggregator
// ============================================================================
//
// Carts are explicit entities keyed by shopper id, created lazily on the
// first add and cleared (never deleted) after checkout. Totals are always
// recomputed from live product state.
//
// ============================================================================

pub struct CartService {
    carts: RwLock<HashMap<Uuid, Cart>>,
    ledger: Arc<dyn InventoryLedger>,
}

impl CartService {
    pub fn new(ledger: Arc<dyn InventoryLedger>) -> Self {
        Self {
            carts: RwLock::new(HashMap::new()),
            ledger,
        }
    }

    /// Add or merge a line; the merged quantity is capped at available stock
    pub async fn add_item(
        &self,
        shopper_id: Uuid,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<CartLineAdjustment, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let product = self
            .ledger
            .product(product_id)
            .await
            .ok_or(CartError::ProductNotFound(product_id))?;
        if !product.is_available() {
            return Err(CartError::ProductUnavailable(product_id));
        }

        let mut carts = self.carts.write().await;
        let cart = carts.entry(shopper_id).or_insert_with(|| Cart::new(shopper_id));

        let existing = cart.line(product_id).map_or(0, |line| line.quantity);
        let requested = clamp_to_u32(i64::from(existing).saturating_add(quantity));
        let adjustment = adjust(product_id, requested, product.stock);
        cart.upsert(product_id, adjustment.quantity);

        tracing::debug!(
            shopper_id = %shopper_id,
            product_id = %product_id,
            quantity = adjustment.quantity,
            clamped = adjustment.clamped,
            "Cart line added"
        );

        Ok(adjustment)
    }

    /// Set a line's quantity; zero removes it. Returns `None` when removed
    pub async fn update_quantity(
        &self,
        shopper_id: Uuid,
        product_id: Uuid,
        quantity: i64,
    ) -> Result<Option<CartLineAdjustment>, CartError> {
        if quantity < 0 {
            return Err(CartError::InvalidQuantity(quantity));
        }

        let in_cart = self
            .carts
            .read()
            .await
            .get(&shopper_id)
            .is_some_and(|cart| cart.contains(product_id));
        if !in_cart {
            return Err(CartError::LineNotFound(product_id));
        }

        if quantity == 0 {
            self.remove_item(shopper_id, product_id).await?;
            return Ok(None);
        }

        let product = self
            .ledger
            .product(product_id)
            .await
            .ok_or(CartError::ProductNotFound(product_id))?;
        if !product.is_available() {
            return Err(CartError::ProductUnavailable(product_id));
        }

        let adjustment = adjust(product_id, clamp_to_u32(quantity), product.stock);

        let mut carts = self.carts.write().await;
        let cart = carts
            .get_mut(&shopper_id)
            .filter(|cart| cart.contains(product_id))
            .ok_or(CartError::LineNotFound(product_id))?;
        cart.upsert(product_id, adjustment.quantity);

        Ok(Some(adjustment))
    }

    pub async fn remove_item(&self, shopper_id: Uuid, product_id: Uuid) -> Result<(), CartError> {
        let mut carts = self.carts.write().await;
        let removed = carts
            .get_mut(&shopper_id)
            .is_some_and(|cart| cart.remove(product_id));

        if removed {
            Ok(())
        } else {
            Err(CartError::LineNotFound(product_id))
        }
    }

    /// Drop the given lines, ignoring ones that are already gone
    pub async fn remove_lines(&self, shopper_id: Uuid, product_ids: &[Uuid]) {
        let mut carts = self.carts.write().await;
        if let Some(cart) = carts.get_mut(&shopper_id) {
            for product_id in product_ids {
                cart.remove(*product_id);
            }
        }
    }

    pub async fn clear(&self, shopper_id: Uuid) {
        let mut carts = self.carts.write().await;
        if let Some(cart) = carts.get_mut(&shopper_id) {
            cart.clear();
        }
    }

    /// Current cart; an empty one when the shopper never added anything
    pub async fn cart(&self, shopper_id: Uuid) -> Cart {
        self.carts
            .read()
            .await
            .get(&shopper_id)
            .cloned()
            .unwrap_or_else(|| Cart::new(shopper_id))
    }

    pub async fn shoppers_holding(&self, product_id: Uuid) -> Vec<Uuid> {
        self.carts
            .read()
            .await
            .values()
            .filter(|cart| cart.contains(product_id))
            .map(|cart| cart.shopper_id)
            .collect()
    }

    pub async fn compute_totals(&self, shopper_id: Uuid) -> CartTotals {
        let cart = self.cart(shopper_id).await;
        let now = Utc::now();

        let mut vendors: Vec<VendorSubtotal> = Vec::new();
        let mut unavailable = Vec::new();
        let mut item_count = 0u32;

        for element in &cart.elements {
            let Some(product) = self.ledger.product(element.product_id).await else {
                unavailable.push(UnavailableLine {
                    product_id: element.product_id,
                    quantity: element.quantity,
                    reason: "not_found".to_string(),
                });
                continue;
            };
            if !product.active {
                unavailable.push(UnavailableLine {
                    product_id: element.product_id,
                    quantity: element.quantity,
                    reason: "inactive".to_string(),
                });
                continue;
            }

            let unit_price = product.effective_price_at(now);
            let line = CartLineView {
                product_id: product.id,
                name: product.name.clone(),
                quantity: element.quantity,
                unit_price,
                on_promotion: product.is_on_promotion_at(now),
                line_total: unit_price * Decimal::from(element.quantity),
                available_stock: product.stock,
            };
            item_count = item_count.saturating_add(element.quantity);

            match vendors.iter_mut().find(|v| v.vendor_id == product.vendor_id) {
                Some(group) => {
                    group.subtotal += line.line_total;
                    group.lines.push(line);
                }
                None => vendors.push(VendorSubtotal {
                    vendor_id: product.vendor_id,
                    subtotal: line.line_total,
                    lines: vec![line],
                }),
            }
        }

        let grand_total: Decimal = vendors.iter().map(|v| v.subtotal).sum();

        CartTotals {
            shopper_id,
            vendors,
            unavailable,
            item_count,
            grand_total,
            computed_at: now,
        }
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn adjust(product_id: Uuid, requested: u32, stock: u32) -> CartLineAdjustment {
    let quantity = requested.min(stock);
    CartLineAdjustment {
        product_id,
        requested,
        quantity,
        clamped: quantity < requested,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::inventory::{InMemoryInventoryLedger, Product, ProductPatch};

    struct Fixture {
        ledger: Arc<InMemoryInventoryLedger>,
        carts: CartService,
        shopper: Uuid,
    }

    fn fixture() -> Fixture {
        let ledger = Arc::new(InMemoryInventoryLedger::new());
        Fixture {
            carts: CartService::new(ledger.clone()),
            ledger,
            shopper: Uuid::new_v4(),
        }
    }

    async fn stocked(f: &Fixture, vendor: Uuid, price: i64, stock: u32) -> Uuid {
        f.ledger
            .insert(Product::new(vendor, "Article", Decimal::new(price, 0), stock))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn adding_twice_merges_quantities() {
        let f = fixture();
        let product = stocked(&f, Uuid::new_v4(), 10, 10).await;

        f.carts.add_item(f.shopper, product, 3).await.unwrap();
        let adjustment = f.carts.add_item(f.shopper, product, 2).await.unwrap();

        assert_eq!(adjustment.quantity, 5);
        assert!(!adjustment.clamped);
        let cart = f.carts.cart(f.shopper).await;
        assert_eq!(cart.elements.len(), 1);
        assert_eq!(cart.elements[0].quantity, 5);
    }

    #[tokio::test]
    async fn merged_quantity_is_clamped_to_stock() {
        let f = fixture();
        let product = stocked(&f, Uuid::new_v4(), 10, 10).await;

        f.carts.add_item(f.shopper, product, 8).await.unwrap();
        let adjustment = f.carts.add_item(f.shopper, product, 5).await.unwrap();

        assert_eq!(adjustment.requested, 13);
        assert_eq!(adjustment.quantity, 10);
        assert!(adjustment.clamped);
    }

    #[tokio::test]
    async fn rejects_bad_quantities_and_unavailable_products() {
        let f = fixture();
        let product = stocked(&f, Uuid::new_v4(), 10, 0).await;

        assert_eq!(f.carts.add_item(f.shopper, product, 0).await, Err(CartError::InvalidQuantity(0)));
        assert_eq!(
            f.carts.add_item(f.shopper, product, 1).await,
            Err(CartError::ProductUnavailable(product))
        );

        let missing = Uuid::new_v4();
        assert_eq!(
            f.carts.add_item(f.shopper, missing, 1).await,
            Err(CartError::ProductNotFound(missing))
        );
    }

    #[tokio::test]
    async fn update_to_zero_removes_and_negative_fails() {
        let f = fixture();
        let product = stocked(&f, Uuid::new_v4(), 10, 10).await;
        f.carts.add_item(f.shopper, product, 2).await.unwrap();

        assert_eq!(
            f.carts.update_quantity(f.shopper, product, -1).await,
            Err(CartError::InvalidQuantity(-1))
        );
        assert_eq!(f.carts.update_quantity(f.shopper, product, 0).await, Ok(None));
        assert!(f.carts.cart(f.shopper).await.is_empty());
        assert_eq!(
            f.carts.remove_item(f.shopper, product).await,
            Err(CartError::LineNotFound(product))
        );
    }

    #[tokio::test]
    async fn update_above_stock_is_clamped() {
        let f = fixture();
        let product = stocked(&f, Uuid::new_v4(), 10, 4).await;
        f.carts.add_item(f.shopper, product, 1).await.unwrap();

        let adjustment = f.carts.update_quantity(f.shopper, product, 9).await.unwrap().unwrap();
        assert_eq!(adjustment.quantity, 4);
        assert!(adjustment.clamped);
    }

    #[tokio::test]
    async fn totals_group_by_vendor_and_use_live_prices() {
        let f = fixture();
        let (vendor_a, vendor_b) = (Uuid::new_v4(), Uuid::new_v4());
        let x = stocked(&f, vendor_a, 20, 5).await;
        let y = stocked(&f, vendor_b, 15, 1).await;
        let z = stocked(&f, vendor_a, 4, 10).await;

        f.carts.add_item(f.shopper, x, 2).await.unwrap();
        f.carts.add_item(f.shopper, y, 1).await.unwrap();
        f.carts.add_item(f.shopper, z, 3).await.unwrap();

        let totals = f.carts.compute_totals(f.shopper).await;
        assert_eq!(totals.vendors.len(), 2);
        assert_eq!(totals.vendors[0].vendor_id, vendor_a);
        assert_eq!(totals.vendors[0].subtotal, Decimal::new(52, 0));
        assert_eq!(totals.vendors[1].subtotal, Decimal::new(15, 0));
        assert_eq!(totals.grand_total, Decimal::new(67, 0));
        assert_eq!(totals.item_count, 6);

        // a promotion started after the item was added is picked up
        f.ledger
            .update(
                x,
                ProductPatch {
                    promotion: Some(crate::domain::inventory::Promotion { price: Decimal::new(18, 0), ends_at: None }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        let totals = f.carts.compute_totals(f.shopper).await;
        assert_eq!(totals.vendors[0].subtotal, Decimal::new(48, 0));
        assert!(totals.vendors[0].lines[0].on_promotion);
    }

    #[tokio::test]
    async fn inactive_lines_are_reported_not_totalled() {
        let f = fixture();
        let product = stocked(&f, Uuid::new_v4(), 10, 3).await;
        f.carts.add_item(f.shopper, product, 1).await.unwrap();
        f.ledger
            .update(product, ProductPatch { active: Some(false), ..Default::default() })
            .await
            .unwrap();

        let totals = f.carts.compute_totals(f.shopper).await;
        assert!(totals.vendors.is_empty());
        assert_eq!(totals.unavailable.len(), 1);
        assert_eq!(totals.grand_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn clear_is_idempotent() {
        let f = fixture();
        let product = stocked(&f, Uuid::new_v4(), 10, 3).await;
        f.carts.add_item(f.shopper, product, 1).await.unwrap();

        f.carts.clear(f.shopper).await;
        f.carts.clear(f.shopper).await;
        f.carts.clear(Uuid::new_v4()).await;

        assert!(f.carts.cart(f.shopper).await.is_empty());
        assert!(f.carts.shoppers_holding(product).await.is_empty());
    }
}
