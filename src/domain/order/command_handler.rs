use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::inventory::InventoryLedger;
use crate::domain::invoice::InvoiceService;
use crate::domain::shared::Principal;
use crate::event_sourcing::core::{Aggregate, EventEnvelope};
use crate::event_sourcing::store::{EventStore, EventStoreError};
use crate::metrics::Metrics;
use crate::utils::KeyedLocks;

use super::aggregate::OrderAggregate;
use super::commands::{OrderCommand, PlaceOrder};
use super::errors::OrderError;
use super::events::OrderEvent;
use super::value_objects::{OrderReference, OrderStatus, PaymentStatus, StatusHistoryEntry};

// ============================================================================
// Order Command Handler
// ============================================================================
//
// Orchestrates: Command → Aggregate → Events → Event Store (+ outbox)
//
// Commands on one order are serialized by a per-order lock; the store's
// version check rejects anything that slips past it. Side effects run after
// the events are durable:
//   annule / refuse  → stock restored for every line
//   livre            → invoice issued and kept
//
// ============================================================================

pub struct OrderCommandHandler {
    event_store: Arc<EventStore<OrderEvent>>,
    ledger: Arc<dyn InventoryLedger>,
    invoices: Arc<InvoiceService>,
    metrics: Arc<Metrics>,
    locks: KeyedLocks<Uuid>,
    /// Last reference number handed to a persisted order
    sequence: Mutex<u64>,
}

impl OrderCommandHandler {
    pub fn new(
        event_store: Arc<EventStore<OrderEvent>>,
        ledger: Arc<dyn InventoryLedger>,
        invoices: Arc<InvoiceService>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            event_store,
            ledger,
            invoices,
            metrics,
            locks: KeyedLocks::new(),
            sequence: Mutex::new(0),
        }
    }

    pub fn event_store(&self) -> &Arc<EventStore<OrderEvent>> {
        &self.event_store
    }

    /// Persist a new order; stock must already be reserved by the caller.
    ///
    /// References run CMD-000001, CMD-000002, ... without gaps: the counter
    /// only advances once the order is durable.
    pub async fn place(&self, command: PlaceOrder, correlation_id: Uuid) -> Result<OrderAggregate, OrderError> {
        let order_id = command.order_id;
        let shopper_id = command.shopper_id;
        let _guard = self.locks.acquire(&order_id).await;

        if self.event_store.aggregate_exists(order_id).await {
            return Err(OrderError::AlreadyExists(order_id));
        }

        let mut sequence = self.sequence.lock().await;
        let reference = OrderReference::from_sequence(*sequence + 1);
        let events = OrderAggregate::initiate(&OrderCommand::PlaceOrder { reference, order: command })?;
        let Some((first, rest)) = events.split_first() else {
            return Err(OrderError::NotInitialized);
        };

        let mut order = OrderAggregate::apply_first_event(first)?;
        for event in rest {
            order.apply_event(event)?;
        }

        let version = self.persist(order_id, 0, events, correlation_id, shopper_id).await?;
        order.set_version(version);
        *sequence += 1;
        drop(sequence);

        self.metrics.record_order_created(order.delivery_mode.as_str());
        tracing::info!(
            order_id = %order.id,
            reference = %order.reference,
            vendor_id = %order.vendor_id,
            grand_total = %order.grand_total,
            "Order placed"
        );

        Ok(order)
    }

    pub async fn transition(
        &self,
        order_id: Uuid,
        actor: Principal,
        target: OrderStatus,
        reason: Option<String>,
    ) -> Result<OrderAggregate, OrderError> {
        let _guard = self.locks.acquire(&order_id).await;

        let mut order = self.order(order_id).await?;
        let from = order.status;
        let events = order.handle_command(&OrderCommand::ChangeStatus { actor, target, reason })?;

        self.commit(&mut order, events, actor).await?;
        self.metrics.record_transition(from.as_str(), target.as_str());

        tracing::info!(
            order_id = %order_id,
            from = %from,
            to = %target,
            actor_role = %actor.role,
            "Order status changed"
        );

        if target.is_voided() {
            self.restore_stock(&order).await;
        }

        if target == OrderStatus::Delivered {
            if let Err(e) = self.invoices.issue(&order).await {
                tracing::warn!(order_id = %order_id, error = %e, "Invoice issuance failed");
            }
        }

        Ok(order)
    }

    /// Returns the order unchanged when `status` is already current
    pub async fn record_payment(
        &self,
        order_id: Uuid,
        actor: Principal,
        status: PaymentStatus,
    ) -> Result<OrderAggregate, OrderError> {
        let _guard = self.locks.acquire(&order_id).await;

        let mut order = self.order(order_id).await?;
        let events = order.handle_command(&OrderCommand::RecordPayment { actor, status })?;
        if events.is_empty() {
            tracing::debug!(order_id = %order_id, payment = %status, "Payment status unchanged");
            return Ok(order);
        }

        let from = order.payment_status;
        self.commit(&mut order, events, actor).await?;
        self.metrics.record_payment_update(status.as_str());

        tracing::info!(
            order_id = %order_id,
            from = %from,
            to = %status,
            actor_role = %actor.role,
            "Payment status recorded"
        );

        Ok(order)
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn order(&self, order_id: Uuid) -> Result<OrderAggregate, OrderError> {
        match self.event_store.load_aggregate::<OrderAggregate>(order_id).await {
            Ok(order) => Ok(order),
            Err(EventStoreError::AggregateNotFound(_)) => Err(OrderError::NotFound(order_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Every order, oldest first
    pub async fn all_orders(&self) -> Result<Vec<OrderAggregate>, OrderError> {
        Ok(self.event_store.load_all::<OrderAggregate>().await?)
    }

    pub async fn orders_for_shopper(&self, shopper_id: Uuid) -> Result<Vec<OrderAggregate>, OrderError> {
        let mut orders = self.all_orders().await?;
        orders.retain(|o| o.shopper_id == shopper_id);
        Ok(orders)
    }

    pub async fn orders_for_vendor(&self, vendor_id: Uuid) -> Result<Vec<OrderAggregate>, OrderError> {
        let mut orders = self.all_orders().await?;
        orders.retain(|o| o.vendor_id == vendor_id);
        Ok(orders)
    }

    pub async fn history(&self, order_id: Uuid) -> Result<Vec<StatusHistoryEntry>, OrderError> {
        Ok(self.order(order_id).await?.history)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    async fn commit(
        &self,
        order: &mut OrderAggregate,
        events: Vec<OrderEvent>,
        actor: Principal,
    ) -> Result<(), OrderError> {
        for event in &events {
            order.apply_event(event)?;
        }
        let version = self
            .persist(order.id, order.version(), events, Uuid::now_v7(), actor.user_id)
            .await?;
        order.set_version(version);
        Ok(())
    }

    async fn persist(
        &self,
        order_id: Uuid,
        expected_version: i64,
        events: Vec<OrderEvent>,
        correlation_id: Uuid,
        actor_id: Uuid,
    ) -> Result<i64, OrderError> {
        let envelopes = events
            .into_iter()
            .zip(expected_version + 1..)
            .map(|(event, seq)| EventEnvelope::new(order_id, seq, event, correlation_id).with_actor(actor_id))
            .collect();

        Ok(self
            .event_store
            .append_events(order_id, expected_version, envelopes, true)
            .await?)
    }

    /// Runs once per order: the voided states are terminal
    async fn restore_stock(&self, order: &OrderAggregate) {
        for line in &order.lines {
            match self.ledger.restore(line.product_id, line.quantity).await {
                Ok(stock) => tracing::debug!(
                    order_id = %order.id,
                    product_id = %line.product_id,
                    restored = line.quantity,
                    stock,
                    "Stock restored"
                ),
                Err(e) => tracing::error!(
                    order_id = %order.id,
                    product_id = %line.product_id,
                    error = %e,
                    "Failed to restore stock"
                ),
            }
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
