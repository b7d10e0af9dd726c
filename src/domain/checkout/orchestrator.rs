use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::domain::cart::CartService;
use crate::domain::inventory::{InventoryError, InventoryLedger, Product};
use crate::domain::notification::{NotificationDispatcher, NotificationKind, PayloadRef};
use crate::domain::order::{OrderAggregate, OrderCommandHandler, OrderError, OrderLine, PlaceOrder};
use crate::metrics::Metrics;
use crate::utils::KeyedLocks;
use super::errors::CheckoutError;
use super::value_objects::{
    CheckoutOutcome, CheckoutRequest, CheckoutSettings, ConflictReason, FailedVendorGroup, StockConflictLine,
};

// ============================================================================
// Checkout Orchestrator
// ============================================================================
//
// 1. Validate the request, load the cart (one checkout per shopper at a time)
// 2. Re-check every line against live product state; any miss aborts the
//    whole checkout before stock is touched
// 3. Partition by vendor; groups commit concurrently, lines in a group
//    sequentially through the ledger
// 4. A decrement lost to a concurrent checkout rolls the group back in
//    reverse order; committed groups stay
// 5. Committed lines leave the cart; low stock is reported to vendors
//
// ============================================================================

struct VendorGroup {
    vendor_id: Uuid,
    lines: Vec<(Product, u32)>,
}

struct CommittedGroup {
    order: OrderAggregate,
    /// (product, remaining stock) after the decrement
    remaining: Vec<(Product, u32)>,
}

enum GroupFailure {
    Stock { vendor_id: Uuid, conflict: StockConflictLine },
    Order { vendor_id: Uuid, error: OrderError },
}

pub struct CheckoutOrchestrator {
    carts: Arc<CartService>,
    ledger: Arc<dyn InventoryLedger>,
    orders: Arc<OrderCommandHandler>,
    notifications: Arc<NotificationDispatcher>,
    metrics: Arc<Metrics>,
    settings: CheckoutSettings,
    shopper_locks: KeyedLocks<Uuid>,
}

impl CheckoutOrchestrator {
    pub fn new(
        carts: Arc<CartService>,
        ledger: Arc<dyn InventoryLedger>,
        orders: Arc<OrderCommandHandler>,
        notifications: Arc<NotificationDispatcher>,
        metrics: Arc<Metrics>,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            carts,
            ledger,
            orders,
            notifications,
            metrics,
            settings,
            shopper_locks: KeyedLocks::new(),
        }
    }

    pub async fn checkout(&self, shopper_id: Uuid, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        let started = Instant::now();
        let result = self.run(shopper_id, request).await;

        let outcome = match &result {
            Ok(outcome) if outcome.is_partial() => "partial",
            Ok(_) => "success",
            Err(CheckoutError::StockConflict(_)) => "conflict",
            Err(CheckoutError::EmptyCart | CheckoutError::Validation(_)) => "rejected",
            Err(CheckoutError::Order(_)) => "error",
        };
        self.metrics.record_checkout(outcome, started.elapsed().as_secs_f64());

        result
    }

    async fn run(&self, shopper_id: Uuid, request: CheckoutRequest) -> Result<CheckoutOutcome, CheckoutError> {
        validate_request(&request)?;

        let _guard = self.shopper_locks.acquire(&shopper_id).await;

        let cart = self.carts.cart(shopper_id).await;
        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        // Live state only; nothing the client computed is reused
        let mut conflicts = Vec::new();
        let mut groups: Vec<VendorGroup> = Vec::new();
        for element in &cart.elements {
            let product = match self.ledger.product(element.product_id).await {
                Some(product) => product,
                None => {
                    conflicts.push(conflict(element.product_id, None, element.quantity, 0, ConflictReason::NotFound));
                    continue;
                }
            };

            if !product.active {
                conflicts.push(conflict(product.id, Some(product.vendor_id), element.quantity, 0, ConflictReason::Inactive));
            } else if product.stock < element.quantity {
                conflicts.push(conflict(
                    product.id,
                    Some(product.vendor_id),
                    element.quantity,
                    product.stock,
                    ConflictReason::InsufficientStock,
                ));
            } else {
                match groups.iter_mut().find(|g| g.vendor_id == product.vendor_id) {
                    Some(group) => group.lines.push((product, element.quantity)),
                    None => groups.push(VendorGroup {
                        vendor_id: product.vendor_id,
                        lines: vec![(product, element.quantity)],
                    }),
                }
            }
        }

        if !conflicts.is_empty() {
            self.metrics.record_stock_conflicts(conflicts.len());
            tracing::warn!(
                shopper_id = %shopper_id,
                conflicts = conflicts.len(),
                "Checkout rejected: cart lines cannot be satisfied"
            );
            return Err(CheckoutError::StockConflict(conflicts));
        }

        let correlation_id = Uuid::now_v7();
        let priced_at = Utc::now();

        let results = join_all(
            groups
                .into_iter()
                .map(|group| self.commit_group(shopper_id, group, &request, priced_at, correlation_id)),
        )
        .await;

        let mut committed = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(group) => committed.push(group),
                Err(failure) => failures.push(failure),
            }
        }

        if committed.is_empty() {
            return Err(all_groups_failed(failures));
        }

        // Only lines that became orders leave the cart; anything added while
        // checkout ran stays for the next attempt
        let product_ids: Vec<Uuid> = committed
            .iter()
            .flat_map(|g| g.order.lines.iter().map(|l| l.product_id))
            .collect();
        self.carts.remove_lines(shopper_id, &product_ids).await;

        self.report_low_stock(&committed).await;

        let failed_groups: Vec<FailedVendorGroup> = failures.into_iter().map(describe_failure).collect();
        let orders: Vec<OrderAggregate> = committed.into_iter().map(|g| g.order).collect();

        tracing::info!(
            shopper_id = %shopper_id,
            correlation_id = %correlation_id,
            orders = orders.len(),
            failed_groups = failed_groups.len(),
            "Checkout completed"
        );

        Ok(CheckoutOutcome {
            correlation_id,
            orders,
            failed_groups,
        })
    }

    async fn commit_group(
        &self,
        shopper_id: Uuid,
        group: VendorGroup,
        request: &CheckoutRequest,
        priced_at: DateTime<Utc>,
        correlation_id: Uuid,
    ) -> Result<CommittedGroup, GroupFailure> {
        let vendor_id = group.vendor_id;
        let mut remaining: Vec<(Product, u32)> = Vec::with_capacity(group.lines.len());

        for (product, quantity) in &group.lines {
            match self.ledger.reserve_and_decrement(product.id, *quantity).await {
                Ok(left) => remaining.push((product.clone(), left)),
                Err(e) => {
                    self.roll_back(vendor_id, &group.lines[..remaining.len()]).await;
                    self.metrics.record_stock_conflicts(1);
                    tracing::warn!(
                        vendor_id = %vendor_id,
                        product_id = %product.id,
                        error = %e,
                        "Vendor group lost a stock race, rolled back"
                    );
                    return Err(GroupFailure::Stock {
                        vendor_id,
                        conflict: race_conflict(product, *quantity, e),
                    });
                }
            }
        }

        let lines = group
            .lines
            .iter()
            .map(|(product, quantity)| {
                OrderLine::new(product.id, product.name.clone(), *quantity, product.effective_price_at(priced_at))
            })
            .collect();

        let command = PlaceOrder {
            order_id: Uuid::now_v7(),
            shopper_id,
            vendor_id,
            lines,
            delivery_mode: request.delivery_mode,
            delivery_address: request.delivery_address.clone(),
            payment_method: request.payment_method,
            notes: request.notes.clone(),
            delivery_fee: self.settings.fees.fee_for(request.delivery_mode),
        };

        match self.orders.place(command, correlation_id).await {
            Ok(order) => Ok(CommittedGroup { order, remaining }),
            Err(error) => {
                self.roll_back(vendor_id, &group.lines).await;
                tracing::error!(vendor_id = %vendor_id, error = %error, "Order placement failed, stock restored");
                Err(GroupFailure::Order { vendor_id, error })
            }
        }
    }

    /// Restore already-decremented lines, last first
    async fn roll_back(&self, vendor_id: Uuid, reserved: &[(Product, u32)]) {
        for (product, quantity) in reserved.iter().rev() {
            if let Err(e) = self.ledger.restore(product.id, *quantity).await {
                tracing::error!(
                    vendor_id = %vendor_id,
                    product_id = %product.id,
                    error = %e,
                    "Rollback failed to restore stock"
                );
            }
        }
    }

    async fn report_low_stock(&self, committed: &[CommittedGroup]) {
        let threshold = self.settings.low_stock_threshold;
        for (product, left) in committed.iter().flat_map(|g| g.remaining.iter()) {
            if *left > threshold {
                continue;
            }
            let message = if *left == 0 {
                format!("Le produit {} est en rupture de stock", product.name)
            } else {
                format!("Le produit {} n'a plus que {} article(s) en stock", product.name, left)
            };
            self.notifications
                .notify(
                    product.vendor_id,
                    NotificationKind::System,
                    "Stock faible",
                    message,
                    Some(PayloadRef::Product(product.id)),
                )
                .await;
        }
    }
}

fn validate_request(request: &CheckoutRequest) -> Result<(), CheckoutError> {
    if !request.delivery_mode.requires_address() {
        return Ok(());
    }
    let missing = match &request.delivery_address {
        Some(address) => address.missing_fields(),
        None => vec!["deliveryAddress"],
    };
    if missing.is_empty() {
        Ok(())
    } else {
        Err(CheckoutError::Validation(format!(
            "{} requires {}",
            request.delivery_mode.as_str(),
            missing.join(", ")
        )))
    }
}

fn conflict(
    product_id: Uuid,
    vendor_id: Option<Uuid>,
    requested: u32,
    available: u32,
    reason: ConflictReason,
) -> StockConflictLine {
    StockConflictLine {
        product_id,
        vendor_id,
        requested,
        available,
        reason,
    }
}

fn race_conflict(product: &Product, requested: u32, error: InventoryError) -> StockConflictLine {
    let (available, reason) = match error {
        InventoryError::InsufficientStock { available, .. } => (available, ConflictReason::InsufficientStock),
        InventoryError::ProductInactive(_) => (0, ConflictReason::Inactive),
        InventoryError::ProductNotFound(_) => (0, ConflictReason::NotFound),
        _ => (0, ConflictReason::InsufficientStock),
    };
    conflict(product.id, Some(product.vendor_id), requested, available, reason)
}

/// Every group rolled back: an order failure wins over stock conflicts
fn all_groups_failed(failures: Vec<GroupFailure>) -> CheckoutError {
    let mut conflicts = Vec::new();
    for failure in failures {
        match failure {
            GroupFailure::Stock { conflict, .. } => conflicts.push(conflict),
            GroupFailure::Order { error, .. } => return CheckoutError::Order(error),
        }
    }
    CheckoutError::StockConflict(conflicts)
}

fn describe_failure(failure: GroupFailure) -> FailedVendorGroup {
    match failure {
        GroupFailure::Stock { vendor_id, conflict } => FailedVendorGroup {
            vendor_id,
            product_id: Some(conflict.product_id),
            reason: format!(
                "insufficient stock: requested {}, available {}",
                conflict.requested, conflict.available
            ),
        },
        GroupFailure::Order { vendor_id, error } => FailedVendorGroup {
            vendor_id,
            product_id: None,
            reason: error.to_string(),
        },
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::directory::PartyDirectory;
    use crate::domain::inventory::{InMemoryInventoryLedger, ProductPatch};
    use crate::domain::invoice::InvoiceService;
    use crate::domain::order::{DeliveryAddress, DeliveryMode, OrderStatus, PaymentMethod};
    use crate::event_sourcing::store::{EventStore, Outbox};
    use async_trait::async_trait;
    use rust_decimal::Decimal;

    /// Ledger whose `reserve_and_decrement` always loses the race for one product
    struct RacingLedger {
        inner: InMemoryInventoryLedger,
        loses: Uuid,
    }

    #[async_trait]
    impl InventoryLedger for RacingLedger {
        async fn reserve_and_decrement(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
            if product_id == self.loses {
                return Err(InventoryError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available: 0,
                });
            }
            self.inner.reserve_and_decrement(product_id, quantity).await
        }

        async fn restore(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
            self.inner.restore(product_id, quantity).await
        }

        async fn product(&self, product_id: Uuid) -> Option<Product> {
            self.inner.product(product_id).await
        }

        async fn products(&self) -> Vec<Product> {
            self.inner.products().await
        }

        async fn products_for_vendor(&self, vendor_id: Uuid) -> Vec<Product> {
            self.inner.products_for_vendor(vendor_id).await
        }

        async fn insert(&self, product: Product) -> Result<Product, InventoryError> {
            self.inner.insert(product).await
        }

        async fn update(&self, product_id: Uuid, patch: ProductPatch) -> Result<Product, InventoryError> {
            self.inner.update(product_id, patch).await
        }
    }

    /// Ledger that lets the shopper add one more product while stock is
    /// being reserved
    struct BusyShopperLedger {
        inner: InMemoryInventoryLedger,
        late_addition: tokio::sync::Mutex<Option<(Arc<CartService>, Uuid, Uuid)>>,
    }

    #[async_trait]
    impl InventoryLedger for BusyShopperLedger {
        async fn reserve_and_decrement(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
            let left = self.inner.reserve_and_decrement(product_id, quantity).await?;
            if let Some((carts, shopper, product)) = self.late_addition.lock().await.take() {
                if let Err(e) = carts.add_item(shopper, product, 1).await {
                    panic!("late addition failed: {e}");
                }
            }
            Ok(left)
        }

        async fn restore(&self, product_id: Uuid, quantity: u32) -> Result<u32, InventoryError> {
            self.inner.restore(product_id, quantity).await
        }

        async fn product(&self, product_id: Uuid) -> Option<Product> {
            self.inner.product(product_id).await
        }

        async fn products(&self) -> Vec<Product> {
            self.inner.products().await
        }

        async fn products_for_vendor(&self, vendor_id: Uuid) -> Vec<Product> {
            self.inner.products_for_vendor(vendor_id).await
        }

        async fn insert(&self, product: Product) -> Result<Product, InventoryError> {
            self.inner.insert(product).await
        }

        async fn update(&self, product_id: Uuid, patch: ProductPatch) -> Result<Product, InventoryError> {
            self.inner.update(product_id, patch).await
        }
    }

    struct Fixture {
        checkout: Arc<CheckoutOrchestrator>,
        carts: Arc<CartService>,
        ledger: Arc<dyn InventoryLedger>,
        orders: Arc<OrderCommandHandler>,
        notifications: Arc<NotificationDispatcher>,
    }

    fn fixture_with(ledger: Arc<dyn InventoryLedger>) -> Fixture {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = Arc::new(EventStore::new(Arc::new(Outbox::new()), "Order", "order-events"));
        let invoices = Arc::new(InvoiceService::new(Arc::new(PartyDirectory::new())));
        let orders = Arc::new(OrderCommandHandler::new(store, ledger.clone(), invoices, metrics.clone()));
        let carts = Arc::new(CartService::new(ledger.clone()));
        let notifications = Arc::new(NotificationDispatcher::new(metrics.clone()));

        let checkout = Arc::new(CheckoutOrchestrator::new(
            carts.clone(),
            ledger.clone(),
            orders.clone(),
            notifications.clone(),
            metrics,
            CheckoutSettings::default(),
        ));

        Fixture { checkout, carts, ledger, orders, notifications }
    }

    fn fixture() -> Fixture {
        fixture_with(Arc::new(InMemoryInventoryLedger::new()))
    }

    async fn stock(ledger: &Arc<dyn InventoryLedger>, id: Uuid) -> u32 {
        ledger.product(id).await.unwrap().stock
    }

    fn pickup() -> CheckoutRequest {
        CheckoutRequest {
            delivery_mode: DeliveryMode::StorePickup,
            delivery_address: None,
            payment_method: PaymentMethod::Mobile,
            notes: None,
        }
    }

    fn standard() -> CheckoutRequest {
        CheckoutRequest {
            delivery_mode: DeliveryMode::Standard,
            delivery_address: Some(DeliveryAddress {
                recipient_name: "Awa Diallo".into(),
                phone: "+221 77 000 00 00".into(),
                street: "12 rue des Manguiers".into(),
                city: "Dakar".into(),
                postal_code: None,
                instructions: None,
            }),
            payment_method: PaymentMethod::DebitCard,
            notes: None,
        }
    }

    #[tokio::test]
    async fn two_vendors_yield_two_orders() {
        let fx = fixture();
        let (vendor_a, vendor_b, shopper) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let x = fx.ledger.insert(Product::new(vendor_a, "Robe", Decimal::new(20, 0), 5)).await.unwrap();
        let y = fx.ledger.insert(Product::new(vendor_b, "Sac", Decimal::new(15, 0), 1)).await.unwrap();

        fx.carts.add_item(shopper, x.id, 2).await.unwrap();
        fx.carts.add_item(shopper, y.id, 1).await.unwrap();

        let outcome = fx.checkout.checkout(shopper, standard()).await.unwrap();
        assert_eq!(outcome.orders.len(), 2);
        assert!(outcome.failed_groups.is_empty());

        let for_a = outcome.orders.iter().find(|o| o.vendor_id == vendor_a).unwrap();
        let for_b = outcome.orders.iter().find(|o| o.vendor_id == vendor_b).unwrap();
        assert_eq!(for_a.subtotal, Decimal::new(40, 0));
        assert_eq!(for_a.grand_total, Decimal::new(45, 0));
        assert_eq!(for_b.grand_total, Decimal::new(20, 0));
        assert_eq!(for_a.lines[0].unit_price, x.price);
        assert_eq!(for_a.status, OrderStatus::Pending);
        assert_eq!(for_a.delivery_address, for_b.delivery_address);

        assert_eq!(stock(&fx.ledger, x.id).await, 3);
        assert_eq!(stock(&fx.ledger, y.id).await, 0);
        assert!(fx.carts.cart(shopper).await.is_empty());
        assert_eq!(fx.orders.orders_for_shopper(shopper).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn promotion_price_is_frozen_into_the_order() {
        let fx = fixture();
        let shopper = Uuid::new_v4();
        let product = fx
            .ledger
            .insert(Product::new(Uuid::new_v4(), "Foulard", Decimal::new(30, 0), 10).with_promotion(Decimal::new(24, 0), None))
            .await
            .unwrap();
        fx.carts.add_item(shopper, product.id, 1).await.unwrap();

        let outcome = fx.checkout.checkout(shopper, pickup()).await.unwrap();
        assert_eq!(outcome.orders[0].lines[0].unit_price, Decimal::new(24, 0));
        assert_eq!(outcome.orders[0].grand_total, Decimal::new(24, 0));
    }

    #[tokio::test]
    async fn empty_cart_is_rejected() {
        let fx = fixture();
        let result = fx.checkout.checkout(Uuid::new_v4(), pickup()).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn delivery_without_address_is_a_validation_error() {
        let fx = fixture();
        let shopper = Uuid::new_v4();
        let product = fx.ledger.insert(Product::new(Uuid::new_v4(), "Robe", Decimal::new(20, 0), 5)).await.unwrap();
        fx.carts.add_item(shopper, product.id, 1).await.unwrap();

        let mut request = standard();
        request.delivery_address = None;
        let result = fx.checkout.checkout(shopper, request).await;

        assert!(matches!(result, Err(CheckoutError::Validation(_))));
        assert_eq!(stock(&fx.ledger, product.id).await, 5);
        assert!(!fx.carts.cart(shopper).await.is_empty());
    }

    #[tokio::test]
    async fn stale_cart_lines_abort_before_touching_stock() {
        let fx = fixture();
        let shopper = Uuid::new_v4();
        let fine = fx.ledger.insert(Product::new(Uuid::new_v4(), "Robe", Decimal::new(20, 0), 5)).await.unwrap();
        let short = fx.ledger.insert(Product::new(Uuid::new_v4(), "Sac", Decimal::new(15, 0), 4)).await.unwrap();
        fx.carts.add_item(shopper, fine.id, 2).await.unwrap();
        fx.carts.add_item(shopper, short.id, 3).await.unwrap();

        // Someone else bought the bag meanwhile
        fx.ledger.reserve_and_decrement(short.id, 3).await.unwrap();

        let result = fx.checkout.checkout(shopper, pickup()).await;
        let Err(CheckoutError::StockConflict(conflicts)) = result else {
            panic!("expected a stock conflict");
        };
        assert_eq!(conflicts.len(), 1);
        assert_eq!(conflicts[0].product_id, short.id);
        assert_eq!(conflicts[0].requested, 3);
        assert_eq!(conflicts[0].available, 1);
        assert_eq!(conflicts[0].reason, ConflictReason::InsufficientStock);

        assert_eq!(stock(&fx.ledger, fine.id).await, 5);
        assert!(fx.orders.all_orders().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn lost_race_rolls_back_only_that_vendor() {
        let inner = InMemoryInventoryLedger::new();
        let (vendor_a, vendor_b, shopper) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let a = inner.insert(Product::new(vendor_a, "Robe", Decimal::new(20, 0), 5)).await.unwrap();
        let b1 = inner.insert(Product::new(vendor_b, "Sac", Decimal::new(15, 0), 4)).await.unwrap();
        let b2 = inner.insert(Product::new(vendor_b, "Ceinture", Decimal::new(8, 0), 2)).await.unwrap();

        let fx = fixture_with(Arc::new(RacingLedger { inner, loses: b2.id }));
        fx.carts.add_item(shopper, a.id, 2).await.unwrap();
        fx.carts.add_item(shopper, b1.id, 1).await.unwrap();
        fx.carts.add_item(shopper, b2.id, 1).await.unwrap();

        let outcome = fx.checkout.checkout(shopper, pickup()).await.unwrap();

        assert_eq!(outcome.orders.len(), 1);
        assert_eq!(outcome.orders[0].vendor_id, vendor_a);
        assert_eq!(outcome.failed_groups.len(), 1);
        assert_eq!(outcome.failed_groups[0].vendor_id, vendor_b);
        assert_eq!(outcome.failed_groups[0].product_id, Some(b2.id));

        assert_eq!(stock(&fx.ledger, a.id).await, 3);
        assert_eq!(stock(&fx.ledger, b1.id).await, 4);
        assert_eq!(stock(&fx.ledger, b2.id).await, 2);

        let cart = fx.carts.cart(shopper).await;
        assert!(!cart.contains(a.id));
        assert!(cart.contains(b1.id));
        assert!(cart.contains(b2.id));
    }

    #[tokio::test]
    async fn lines_added_during_checkout_stay_in_the_cart() {
        let inner = InMemoryInventoryLedger::new();
        let shopper = Uuid::new_v4();
        let robe = inner.insert(Product::new(Uuid::new_v4(), "Robe", Decimal::new(20, 0), 5)).await.unwrap();
        let pagne = inner.insert(Product::new(Uuid::new_v4(), "Pagne", Decimal::new(12, 0), 5)).await.unwrap();

        let ledger = Arc::new(BusyShopperLedger { inner, late_addition: tokio::sync::Mutex::new(None) });
        let fx = fixture_with(ledger.clone());
        fx.carts.add_item(shopper, robe.id, 1).await.unwrap();
        *ledger.late_addition.lock().await = Some((fx.carts.clone(), shopper, pagne.id));

        let outcome = fx.checkout.checkout(shopper, pickup()).await.unwrap();
        assert_eq!(outcome.orders.len(), 1);
        assert!(outcome.failed_groups.is_empty());
        assert_eq!(outcome.orders[0].lines[0].product_id, robe.id);

        let cart = fx.carts.cart(shopper).await;
        assert!(!cart.contains(robe.id));
        assert!(cart.contains(pagne.id));
        assert_eq!(stock(&fx.ledger, pagne.id).await, 5);
    }

    #[tokio::test]
    async fn every_group_lost_is_a_stock_conflict() {
        let inner = InMemoryInventoryLedger::new();
        let shopper = Uuid::new_v4();
        let only = inner.insert(Product::new(Uuid::new_v4(), "Robe", Decimal::new(20, 0), 5)).await.unwrap();

        let fx = fixture_with(Arc::new(RacingLedger { inner, loses: only.id }));
        fx.carts.add_item(shopper, only.id, 1).await.unwrap();

        let result = fx.checkout.checkout(shopper, pickup()).await;
        assert!(matches!(result, Err(CheckoutError::StockConflict(lines)) if lines.len() == 1));
        assert!(fx.carts.cart(shopper).await.contains(only.id));
    }

    #[tokio::test]
    async fn concurrent_checkouts_never_oversell() {
        let fx = fixture();
        let product = fx.ledger.insert(Product::new(Uuid::new_v4(), "Sandales", Decimal::new(25, 0), 5)).await.unwrap();

        let mut shoppers = Vec::new();
        for _ in 0..20 {
            let shopper = Uuid::new_v4();
            fx.carts.add_item(shopper, product.id, 1).await.unwrap();
            shoppers.push(shopper);
        }

        let mut handles = Vec::new();
        for shopper in shoppers {
            let checkout = fx.checkout.clone();
            handles.push(tokio::spawn(async move { checkout.checkout(shopper, pickup()).await }));
        }

        let mut placed = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(outcome) => placed += outcome.orders.len(),
                Err(CheckoutError::StockConflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(placed, 5);
        assert_eq!(stock(&fx.ledger, product.id).await, 0);
    }

    #[tokio::test]
    async fn low_stock_notifies_the_vendor() {
        let fx = fixture();
        let (vendor, shopper) = (Uuid::new_v4(), Uuid::new_v4());
        let product = fx.ledger.insert(Product::new(vendor, "Robe", Decimal::new(20, 0), 4)).await.unwrap();
        fx.carts.add_item(shopper, product.id, 2).await.unwrap();

        fx.checkout.checkout(shopper, pickup()).await.unwrap();

        let inbox = fx.notifications.list(vendor).await;
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].kind, NotificationKind::System);
        assert_eq!(inbox[0].payload, Some(PayloadRef::Product(product.id)));
    }
}
