mod server;

use prometheus::{
    Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

pub use server::{configure_observability, health_handler, metrics_handler};

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Covers:
// - Checkout outcomes, latency and stock conflicts
// - Order status and payment transitions
// - Notifications created, relay deliveries and the dead letter queue
// - Retry attempts and circuit breaker state
//
// Everything is registered on one registry, scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Checkout
    pub checkouts_total: IntCounterVec,
    pub checkout_duration: Histogram,
    pub orders_created: IntCounterVec,
    pub stock_conflicts_total: IntCounter,

    // Order lifecycle
    pub order_transitions: IntCounterVec,
    pub payment_updates: IntCounterVec,

    // Notifications & relay
    pub notifications_created: IntCounterVec,
    pub relay_deliveries: IntCounterVec,
    pub relay_delivery_duration: HistogramVec,
    pub outbox_backlog: IntGauge,

    // Retry
    pub retry_attempts_total: IntCounterVec,
    pub retry_success: IntCounterVec,
    pub retry_failure: IntCounterVec,

    // DLQ
    pub dlq_messages_total: IntCounter,
    pub dlq_messages_by_event_type: IntCounterVec,

    // Circuit breaker
    pub circuit_breaker_state: IntGauge,
    pub circuit_breaker_transitions: IntCounterVec,
}

impl Metrics {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let checkouts_total = IntCounterVec::new(
            Opts::new("mall_checkouts_total", "Checkout attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(checkouts_total.clone()))?;

        let checkout_duration = Histogram::with_opts(
            HistogramOpts::new("mall_checkout_duration_seconds", "End-to-end checkout duration")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let orders_created = IntCounterVec::new(
            Opts::new("mall_orders_created_total", "Orders created by delivery mode"),
            &["delivery_mode"],
        )?;
        registry.register(Box::new(orders_created.clone()))?;

        let stock_conflicts_total = IntCounter::new(
            "mall_stock_conflicts_total",
            "Checkout lines rejected for insufficient stock",
        )?;
        registry.register(Box::new(stock_conflicts_total.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("mall_order_transitions_total", "Order status transitions"),
            &["from_status", "to_status"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let payment_updates = IntCounterVec::new(
            Opts::new("mall_payment_updates_total", "Payment status updates"),
            &["status"],
        )?;
        registry.register(Box::new(payment_updates.clone()))?;

        let notifications_created = IntCounterVec::new(
            Opts::new("mall_notifications_created_total", "Notifications created by kind"),
            &["kind"],
        )?;
        registry.register(Box::new(notifications_created.clone()))?;

        let relay_deliveries = IntCounterVec::new(
            Opts::new("outbox_relay_deliveries_total", "Outbox messages handled by the relay"),
            &["event_type", "outcome"],
        )?;
        registry.register(Box::new(relay_deliveries.clone()))?;

        let relay_delivery_duration = HistogramVec::new(
            HistogramOpts::new("outbox_relay_delivery_duration_seconds", "Relay delivery duration")
                .buckets(vec![0.0001, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
            &["event_type"],
        )?;
        registry.register(Box::new(relay_delivery_duration.clone()))?;

        let outbox_backlog = IntGauge::new("outbox_backlog", "Outbox messages waiting for the relay")?;
        registry.register(Box::new(outbox_backlog.clone()))?;

        let retry_attempts_total = IntCounterVec::new(
            Opts::new("retry_attempts_total", "Total retry attempts"),
            &["operation", "attempt"],
        )?;
        registry.register(Box::new(retry_attempts_total.clone()))?;

        let retry_success = IntCounterVec::new(
            Opts::new("retry_success_total", "Operations that succeeded after retrying"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_success.clone()))?;

        let retry_failure = IntCounterVec::new(
            Opts::new("retry_failure_total", "Operations that failed after all attempts"),
            &["operation"],
        )?;
        registry.register(Box::new(retry_failure.clone()))?;

        let dlq_messages_total = IntCounter::new("dlq_messages_total", "Total messages in dead letter queue")?;
        registry.register(Box::new(dlq_messages_total.clone()))?;

        let dlq_messages_by_event_type = IntCounterVec::new(
            Opts::new("dlq_messages_by_event_type", "DLQ messages by event type"),
            &["event_type"],
        )?;
        registry.register(Box::new(dlq_messages_by_event_type.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        let circuit_breaker_transitions = IntCounterVec::new(
            Opts::new("circuit_breaker_transitions_total", "Circuit breaker state transitions"),
            &["from_state", "to_state"],
        )?;
        registry.register(Box::new(circuit_breaker_transitions.clone()))?;

        Ok(Self {
            registry,
            checkouts_total,
            checkout_duration,
            orders_created,
            stock_conflicts_total,
            order_transitions,
            payment_updates,
            notifications_created,
            relay_deliveries,
            relay_delivery_duration,
            outbox_backlog,
            retry_attempts_total,
            retry_success,
            retry_failure,
            dlq_messages_total,
            dlq_messages_by_event_type,
            circuit_breaker_state,
            circuit_breaker_transitions,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_checkout(&self, outcome: &str, duration_secs: f64) {
        self.checkouts_total.with_label_values(&[outcome]).inc();
        self.checkout_duration.observe(duration_secs);
    }

    pub fn record_order_created(&self, delivery_mode: &str) {
        self.orders_created.with_label_values(&[delivery_mode]).inc();
    }

    pub fn record_stock_conflicts(&self, lines: usize) {
        self.stock_conflicts_total.inc_by(lines as u64);
    }

    pub fn record_transition(&self, from: &str, to: &str) {
        self.order_transitions.with_label_values(&[from, to]).inc();
    }

    pub fn record_payment_update(&self, status: &str) {
        self.payment_updates.with_label_values(&[status]).inc();
    }

    pub fn record_notification(&self, kind: &str) {
        self.notifications_created.with_label_values(&[kind]).inc();
    }

    pub fn record_relay_delivery(&self, event_type: &str, outcome: &str, duration_secs: f64) {
        self.relay_deliveries.with_label_values(&[event_type, outcome]).inc();
        self.relay_delivery_duration.with_label_values(&[event_type]).observe(duration_secs);
    }

    pub fn set_outbox_backlog(&self, pending: usize) {
        self.outbox_backlog.set(pending as i64);
    }

    pub fn record_retry_attempt(&self, operation: &str, attempt: u32) {
        self.retry_attempts_total.with_label_values(&[operation, &attempt.to_string()]).inc();
    }

    pub fn record_retry_outcome(&self, operation: &str, success: bool) {
        if success {
            self.retry_success.with_label_values(&[operation]).inc();
        } else {
            self.retry_failure.with_label_values(&[operation]).inc();
        }
    }

    pub fn record_dlq_message(&self, event_type: &str) {
        self.dlq_messages_total.inc();
        self.dlq_messages_by_event_type.with_label_values(&[event_type]).inc();
    }

    pub fn update_circuit_breaker_state(&self, state: i64) {
        self.circuit_breaker_state.set(state);
    }

    pub fn record_circuit_breaker_transition(&self, from_state: &str, to_state: &str) {
        self.circuit_breaker_transitions.with_label_values(&[from_state, to_state]).inc();
    }
}
