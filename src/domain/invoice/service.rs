use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::directory::PartyDirectory;
use crate::domain::order::OrderAggregate;
use super::document::{build_invoice, Invoice, InvoiceError};

// ============================================================================
// Invoice Generator
// ============================================================================
//
// Invoices are derived from the order snapshot on demand. The one issued when
// an order is delivered is kept so later reads return exactly that document.
//
// ============================================================================

pub struct InvoiceService {
    directory: Arc<PartyDirectory>,
    issued: RwLock<HashMap<Uuid, Invoice>>,
}

impl InvoiceService {
    pub fn new(directory: Arc<PartyDirectory>) -> Self {
        Self {
            directory,
            issued: RwLock::new(HashMap::new()),
        }
    }

    pub async fn generate(&self, order: &OrderAggregate) -> Result<Invoice, InvoiceError> {
        let vendor = self.directory.resolve(order.vendor_id).await;
        let shopper = self.directory.resolve(order.shopper_id).await;
        build_invoice(order, vendor, shopper)
    }

    /// Generate and keep; an already issued invoice is returned unchanged
    pub async fn issue(&self, order: &OrderAggregate) -> Result<Invoice, InvoiceError> {
        if let Some(existing) = self.issued.read().await.get(&order.id) {
            return Ok(existing.clone());
        }

        let invoice = self.generate(order).await?;
        let mut issued = self.issued.write().await;
        let kept = issued.entry(order.id).or_insert(invoice).clone();

        tracing::info!(
            order_id = %order.id,
            invoice_number = %kept.number,
            "Invoice issued"
        );

        Ok(kept)
    }

    /// Issued invoice if any, otherwise a freshly generated one
    pub async fn invoice_for(&self, order: &OrderAggregate) -> Result<Invoice, InvoiceError> {
        if let Some(existing) = self.issued.read().await.get(&order.id) {
            return Ok(existing.clone());
        }
        self.generate(order).await
    }

    pub async fn issued(&self, order_id: Uuid) -> Option<Invoice> {
        self.issued.read().await.get(&order_id).cloned()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::directory::{PartyKind, PartyProfile};
    use crate::domain::invoice::render_invoice;
    use crate::domain::order::*;
    use crate::domain::shared::Principal;
    use crate::event_sourcing::core::Aggregate;
    use rust_decimal::Decimal;

    fn order() -> OrderAggregate {
        let order = PlaceOrder {
            order_id: Uuid::new_v4(),
            shopper_id: Uuid::new_v4(),
            vendor_id: Uuid::new_v4(),
            lines: vec![OrderLine::new(Uuid::new_v4(), "Sandales", 2, Decimal::new(2000, 2))],
            delivery_mode: DeliveryMode::StorePickup,
            delivery_address: None,
            payment_method: PaymentMethod::Cash,
            notes: None,
            delivery_fee: Decimal::ZERO,
        };
        let command = OrderCommand::PlaceOrder { reference: OrderReference::from_sequence(7), order };
        let events = OrderAggregate::initiate(&command).unwrap();
        OrderAggregate::apply_first_event(&events[0]).unwrap()
    }

    fn transition(order: &mut OrderAggregate, actor: Principal, target: OrderStatus) {
        let events = order
            .handle_command(&OrderCommand::ChangeStatus { actor, target, reason: None })
            .unwrap();
        for event in &events {
            order.apply_event(event).unwrap();
        }
    }

    #[tokio::test]
    async fn generation_is_deterministic() {
        let directory = Arc::new(PartyDirectory::new());
        let order = order();
        directory
            .register(PartyProfile::new(order.vendor_id, PartyKind::Boutique, "Maison Nour"))
            .await;
        let service = InvoiceService::new(directory);

        let first = service.generate(&order).await.unwrap();
        let second = service.generate(&order).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(render_invoice(&first), render_invoice(&second));
        assert_eq!(first.number, "FAC-000007");
        assert_eq!(first.grand_total, Decimal::new(40, 0));
        assert!(first.vendor.is_resolved());
        assert!(!first.shopper.is_resolved());

        let text = render_invoice(&first);
        assert!(text.contains("Sandales : 2 x 20.00 = 40.00"));
        assert!(text.contains("Total : 40.00"));
    }

    #[tokio::test]
    async fn cancelled_orders_have_no_invoice() {
        let service = InvoiceService::new(Arc::new(PartyDirectory::new()));
        let mut order = order();
        let shopper = Principal::shopper(order.shopper_id);
        transition(&mut order, shopper, OrderStatus::Cancelled);

        assert_eq!(
            service.generate(&order).await,
            Err(InvoiceError::InvoiceUnavailable { order_id: order.id, status: OrderStatus::Cancelled })
        );
    }

    #[tokio::test]
    async fn delivered_invoice_is_dated_on_delivery_and_kept() {
        let service = InvoiceService::new(Arc::new(PartyDirectory::new()));
        let mut order = order();
        let vendor = Principal::vendor(order.vendor_id);
        for target in [OrderStatus::Preparing, OrderStatus::Ready, OrderStatus::Delivered] {
            transition(&mut order, vendor, target);
        }

        let issued = service.issue(&order).await.unwrap();
        assert_eq!(Some(issued.issued_on), order.delivered_at());
        assert_eq!(service.issued(order.id).await, Some(issued.clone()));
        assert_eq!(service.invoice_for(&order).await.unwrap(), issued);
    }
}
