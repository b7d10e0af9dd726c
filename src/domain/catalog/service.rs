use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::cart::CartService;
use crate::domain::inventory::{InventoryError, InventoryLedger, Product, ProductPatch, Promotion};
use crate::domain::notification::{NotificationDispatcher, NotificationKind, PayloadRef};
use crate::domain::shared::{format_money, Money, Principal, Role};

// ============================================================================
// Catalog Service
// ============================================================================
//
// Boutiques manage their own products; admins may edit any product. A newly
// set promotion is announced to every shopper holding the product in a cart.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CatalogError {
    #[error("Only boutiques can create products")]
    NotAVendor,

    #[error("Product {product_id} belongs to another boutique")]
    NotOwner { product_id: Uuid },

    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub price: Money,
    pub stock: u32,
    #[serde(default)]
    pub promotion: Option<Promotion>,
}

pub struct CatalogService {
    ledger: Arc<dyn InventoryLedger>,
    carts: Arc<CartService>,
    notifications: Arc<NotificationDispatcher>,
}

impl CatalogService {
    pub fn new(
        ledger: Arc<dyn InventoryLedger>,
        carts: Arc<CartService>,
        notifications: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            ledger,
            carts,
            notifications,
        }
    }

    pub async fn create_product(&self, actor: &Principal, draft: ProductDraft) -> Result<Product, CatalogError> {
        if actor.role != Role::Vendor {
            return Err(CatalogError::NotAVendor);
        }

        let mut product = Product::new(actor.user_id, draft.name.trim(), draft.price, draft.stock);
        product.image_url = draft.image_url;
        product.promotion = draft.promotion;

        Ok(self.ledger.insert(product).await?)
    }

    pub async fn update_product(
        &self,
        actor: &Principal,
        product_id: Uuid,
        patch: ProductPatch,
    ) -> Result<Product, CatalogError> {
        let current = self
            .ledger
            .product(product_id)
            .await
            .ok_or(InventoryError::ProductNotFound(product_id))?;

        let allowed = match actor.role {
            Role::Admin => true,
            Role::Vendor => current.vendor_id == actor.user_id,
            Role::Shopper => false,
        };
        if !allowed {
            return Err(CatalogError::NotOwner { product_id });
        }

        let updated = self.ledger.update(product_id, patch).await?;

        if updated.is_on_promotion_at(updated.updated_at) && updated.promotion != current.promotion {
            self.announce_promotion(&updated).await;
        }

        tracing::info!(
            product_id = %product_id,
            actor_id = %actor.user_id,
            stock = updated.stock,
            active = updated.active,
            "Product updated"
        );

        Ok(updated)
    }

    async fn announce_promotion(&self, product: &Product) {
        let price = product.effective_price_at(product.updated_at);
        let shoppers = self.carts.shoppers_holding(product.id).await;

        for shopper_id in &shoppers {
            self.notifications
                .notify(
                    *shopper_id,
                    NotificationKind::Promotion,
                    "Promotion",
                    format!(
                        "{} de votre panier passe à {} au lieu de {}",
                        product.name,
                        format_money(price),
                        format_money(product.price)
                    ),
                    Some(PayloadRef::Product(product.id)),
                )
                .await;
        }

        tracing::debug!(product_id = %product.id, notified = shoppers.len(), "Promotion announced");
    }
}
