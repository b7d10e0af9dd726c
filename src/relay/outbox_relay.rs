use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

use crate::domain::notification::{DomainNotice, NoticeSink};
use crate::domain::order::{OrderAggregate, OrderEvent};
use crate::event_sourcing::core::deserialize_event;
use crate::event_sourcing::store::{EventStore, Outbox, OutboxMessage};
use crate::metrics::Metrics;
use crate::utils::{retry_on_transient, RetryConfig, RetryResult};
use super::dlq::DeadLetterQueue;

// ============================================================================
// Outbox Relay
// ============================================================================
//
// Polls the outbox, turns each order event into a `DomainNotice` and hands it
// to the sink with retry. Delivery is at-least-once; the sink deduplicates.
// Anything that cannot be delivered ends up in the dead letter queue and never
// affects the order that produced it.
//
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub delivered: usize,
    pub notifications: usize,
    pub dead_lettered: usize,
}

pub struct OutboxRelay {
    outbox: Arc<Outbox>,
    orders: Arc<EventStore<OrderEvent>>,
    sink: Arc<dyn NoticeSink>,
    dlq: Arc<DeadLetterQueue>,
    metrics: Arc<Metrics>,
    retry: RetryConfig,
    batch_size: usize,
}

impl OutboxRelay {
    pub fn new(
        outbox: Arc<Outbox>,
        orders: Arc<EventStore<OrderEvent>>,
        sink: Arc<dyn NoticeSink>,
        dlq: Arc<DeadLetterQueue>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            outbox,
            orders,
            sink,
            dlq,
            metrics,
            retry: RetryConfig::default(),
            batch_size: 100,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Drain one batch
    pub async fn relay_pending(&self) -> RelayReport {
        let batch = self.outbox.take_batch(self.batch_size).await;
        let mut report = RelayReport::default();

        for message in batch {
            let started = Instant::now();

            let notice = match self.to_notice(&message).await {
                Ok(notice) => notice,
                Err(reason) => {
                    self.dlq.add(&message, reason, 1).await;
                    self.metrics
                        .record_relay_delivery(&message.event_type, "undecodable", started.elapsed().as_secs_f64());
                    report.dead_lettered += 1;
                    continue;
                }
            };

            let result = retry_on_transient(&self.retry, "notification_delivery", Some(self.metrics.as_ref()), |_| {
                let sink = self.sink.clone();
                let notice = notice.clone();
                async move { sink.deliver(&notice).await }
            })
            .await;

            let elapsed = started.elapsed().as_secs_f64();
            match result {
                RetryResult::Success(created) => {
                    report.delivered += 1;
                    report.notifications += created;
                    self.metrics.record_relay_delivery(&message.event_type, "delivered", elapsed);
                }
                RetryResult::Failed { error, attempts } => {
                    self.dlq.add(&message, error.to_string(), attempts).await;
                    self.metrics.record_relay_delivery(&message.event_type, "dead_lettered", elapsed);
                    report.dead_lettered += 1;
                }
                RetryResult::PermanentFailure(error) => {
                    self.dlq.add(&message, error.to_string(), 1).await;
                    self.metrics.record_relay_delivery(&message.event_type, "dead_lettered", elapsed);
                    report.dead_lettered += 1;
                }
            }
        }

        self.metrics.set_outbox_backlog(self.outbox.len().await);

        if report != RelayReport::default() {
            tracing::debug!(
                delivered = report.delivered,
                notifications = report.notifications,
                dead_lettered = report.dead_lettered,
                "Outbox batch relayed"
            );
        }

        report
    }

    /// Poll forever on `interval`
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!(interval_ms = interval.as_millis() as u64, "📨 Outbox relay started");
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                self.relay_pending().await;
            }
        })
    }

    async fn to_notice(&self, message: &OutboxMessage) -> Result<DomainNotice, String> {
        let event: OrderEvent =
            deserialize_event(&message.payload).map_err(|e| format!("undecodable payload: {e}"))?;

        match event {
            OrderEvent::Created(created) => Ok(DomainNotice::OrderCreated {
                event_id: message.event_id,
                order_id: created.order_id,
                reference: created.reference.to_string(),
                shopper_id: created.shopper_id,
                vendor_id: created.vendor_id,
                grand_total: created.grand_total,
            }),
            OrderEvent::StatusChanged(changed) => {
                let order = self.load_order(message).await?;
                Ok(DomainNotice::OrderStatusChanged {
                    event_id: message.event_id,
                    order_id: order.id,
                    reference: order.reference.to_string(),
                    shopper_id: order.shopper_id,
                    vendor_id: order.vendor_id,
                    from: changed.from,
                    to: changed.to,
                    actor_role: changed.actor_role,
                    reason: changed.reason,
                })
            }
            OrderEvent::PaymentStatusChanged(changed) => {
                let order = self.load_order(message).await?;
                Ok(DomainNotice::PaymentStatusChanged {
                    event_id: message.event_id,
                    order_id: order.id,
                    reference: order.reference.to_string(),
                    shopper_id: order.shopper_id,
                    vendor_id: order.vendor_id,
                    to: changed.to,
                })
            }
        }
    }

    /// Parties and reference live on the order, not on later events
    async fn load_order(&self, message: &OutboxMessage) -> Result<OrderAggregate, String> {
        self.orders
            .load_aggregate(message.aggregate_id)
            .await
            .map_err(|e| format!("cannot load order {}: {e}", message.aggregate_id))
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
