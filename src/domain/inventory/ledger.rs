use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::errors::InventoryError;
use super::value_objects::{Product, ProductPatch};

// ============================================================================
// Inventory Ledger
// ============================================================================
//
// Owns stock counts and prices. `reserve_and_decrement` is the one operation
// that must never lose an update: the stock check and the decrement happen
// under the product's own mutex, so concurrent checkouts of the same product
// serialize while other products stay independent.
//
// ============================================================================

#[async_trait]
pub trait InventoryLedger: Send + Sync {
    /// Check `stock >= quantity` and decrement atomically; returns remaining stock
    async fn reserve_and_decrement(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError>;

    /// Put stock back (cancellation, refusal, rollback); returns new stock
    async fn restore(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError>;

    async fn product(&self, product_id: Uuid) -> Option<Product>;

    /// Every product, in insertion order
    async fn products(&self) -> Vec<Product>;

    async fn products_for_vendor(&self, vendor_id: Uuid) -> Vec<Product>;

    async fn insert(&self, product: Product) -> Result<Product, InventoryError>;

    async fn update(&self, product_id: Uuid, patch: ProductPatch) -> Result<Product, InventoryError>;
}

#[derive(Default)]
struct Catalog {
    by_id: HashMap<Uuid, Arc<Mutex<Product>>>,
    insertion_order: Vec<Uuid>,
}

#[derive(Default)]
pub struct InMemoryInventoryLedger {
    catalog: RwLock<Catalog>,
}

impl InMemoryInventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    async fn slot(&self, product_id: Uuid) -> Result<Arc<Mutex<Product>>, InventoryError> {
        self.catalog
            .read()
            .await
            .by_id
            .get(&product_id)
            .cloned()
            .ok_or(InventoryError::ProductNotFound(product_id))
    }

    async fn snapshot(&self) -> Vec<Product> {
        let slots: Vec<Arc<Mutex<Product>>> = {
            let catalog = self.catalog.read().await;
            catalog
                .insertion_order
                .iter()
                .filter_map(|id| catalog.by_id.get(id).cloned())
                .collect()
        };

        let mut products = Vec::with_capacity(slots.len());
        for slot in slots {
            products.push(slot.lock().await.clone());
        }
        products
    }
}

#[async_trait]
impl InventoryLedger for InMemoryInventoryLedger {
    async fn reserve_and_decrement(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::InvalidQuantity);
        }

        let slot = self.slot(product_id).await?;
        let mut product = slot.lock().await;

        if !product.active {
            return Err(InventoryError::ProductInactive(product_id));
        }
        if product.stock < quantity {
            return Err(InventoryError::InsufficientStock {
                product_id,
                requested: quantity,
                available: product.stock,
            });
        }

        product.stock -= quantity;

        tracing::debug!(
            product_id = %product_id,
            quantity = quantity,
            remaining = product.stock,
            "Stock decremented"
        );

        Ok(product.stock)
    }

    async fn restore(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
        let slot = self.slot(product_id).await?;
        let mut product = slot.lock().await;
        product.stock = product.stock.saturating_add(quantity);

        tracing::debug!(
            product_id = %product_id,
            quantity = quantity,
            stock = product.stock,
            "Stock restored"
        );

        Ok(product.stock)
    }

    async fn product(&self, product_id: Uuid) -> Option<Product> {
        let slot = self.slot(product_id).await.ok()?;
        let product = slot.lock().await;
        Some(product.clone())
    }

    async fn products(&self) -> Vec<Product> {
        self.snapshot().await
    }

    async fn products_for_vendor(&self, vendor_id: Uuid) -> Vec<Product> {
        self.snapshot()
            .await
            .into_iter()
            .filter(|p| p.vendor_id == vendor_id)
            .collect()
    }

    async fn insert(&self, product: Product) -> Result<Product, InventoryError> {
        product.validate()?;

        let mut catalog = self.catalog.write().await;
        if catalog.by_id.contains_key(&product.id) {
            return Err(InventoryError::DuplicateProduct(product.id));
        }

        catalog.insertion_order.push(product.id);
        catalog.by_id.insert(product.id, Arc::new(Mutex::new(product.clone())));

        tracing::info!(
            product_id = %product.id,
            vendor_id = %product.vendor_id,
            stock = product.stock,
            "Product registered"
        );

        Ok(product)
    }

    async fn update(&self, product_id: Uuid, patch: ProductPatch) -> Result<Product, InventoryError> {
        let slot = self.slot(product_id).await?;
        let mut product = slot.lock().await;

        let next = patch.apply_to(&product);
        next.validate()?;
        *product = next.clone();

        Ok(next)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
