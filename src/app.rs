use std::sync::Arc;

use crate::config::MallConfig;
use crate::domain::cart::CartService;
use crate::domain::catalog::CatalogService;
use crate::domain::checkout::CheckoutOrchestrator;
use crate::domain::directory::PartyDirectory;
use crate::domain::inventory::{InMemoryInventoryLedger, InventoryLedger};
use crate::domain::invoice::InvoiceService;
use crate::domain::notification::NotificationDispatcher;
use crate::domain::order::{OrderCommandHandler, OrderEvent};
use crate::domain::statistics::StatisticsAggregator;
use crate::event_sourcing::store::{EventStore, Outbox};
use crate::health::HealthMonitor;
use crate::identity::{GuardedIdentity, IdentityError, IdentityProvider, StaticTokenIdentity};
use crate::metrics::Metrics;
use crate::relay::{DeadLetterQueue, OutboxRelay};
use crate::seed;
use crate::utils::CircuitBreaker;

// ============================================================================
// Service Wiring
// ============================================================================
//
// Builds every component once and shares it through `Arc`s:
//
//   EventStore<OrderEvent> ──► Outbox ──► OutboxRelay ──► NotificationDispatcher
//          ▲                                   │
//   OrderCommandHandler ◄── CheckoutOrchestrator ◄── CartService
//          │                                   └──► DeadLetterQueue
//          └──► InventoryLedger, InvoiceService
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Failed to register metrics: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

pub struct MallServices {
    pub metrics: Arc<Metrics>,
    pub outbox: Arc<Outbox>,
    pub order_events: Arc<EventStore<OrderEvent>>,
    pub ledger: Arc<dyn InventoryLedger>,
    pub directory: Arc<PartyDirectory>,
    pub carts: Arc<CartService>,
    pub orders: Arc<OrderCommandHandler>,
    pub invoices: Arc<InvoiceService>,
    pub notifications: Arc<NotificationDispatcher>,
    pub checkout: Arc<CheckoutOrchestrator>,
    pub catalog: Arc<CatalogService>,
    pub statistics: Arc<StatisticsAggregator>,
    pub identity: Arc<dyn IdentityProvider>,
    pub identity_breaker: Arc<CircuitBreaker>,
    pub dlq: Arc<DeadLetterQueue>,
    pub relay: Arc<OutboxRelay>,
    pub health: Arc<HealthMonitor>,
}

impl MallServices {
    /// Wire everything using the token table from `config`
    pub fn build(config: &MallConfig) -> Result<Self, StartupError> {
        let mut entries = config.identity_tokens.clone();
        if config.seed_demo {
            if !entries.trim().is_empty() {
                entries.push(',');
            }
            entries.push_str(&seed::demo_identity_entries());
        }

        let identity = StaticTokenIdentity::parse(&entries)?;
        if identity.is_empty() {
            tracing::warn!("⚠️  No identity tokens configured, every API call will be rejected");
        }

        Self::with_identity(config, Arc::new(identity))
    }

    /// Wire everything around a caller-supplied identity provider
    pub fn with_identity(config: &MallConfig, provider: Arc<dyn IdentityProvider>) -> Result<Self, StartupError> {
        let metrics = Arc::new(Metrics::new()?);

        let outbox = Arc::new(Outbox::new());
        let order_events = Arc::new(EventStore::new(outbox.clone(), "Order", "order-events"));

        let ledger: Arc<dyn InventoryLedger> = Arc::new(InMemoryInventoryLedger::new());
        let directory = Arc::new(PartyDirectory::new());
        let carts = Arc::new(CartService::new(ledger.clone()));
        let invoices = Arc::new(InvoiceService::new(directory.clone()));
        let notifications = Arc::new(NotificationDispatcher::new(metrics.clone()));

        let orders = Arc::new(OrderCommandHandler::new(
            order_events.clone(),
            ledger.clone(),
            invoices.clone(),
            metrics.clone(),
        ));

        let checkout = Arc::new(CheckoutOrchestrator::new(
            carts.clone(),
            ledger.clone(),
            orders.clone(),
            notifications.clone(),
            metrics.clone(),
            config.checkout_settings(),
        ));

        let catalog = Arc::new(CatalogService::new(ledger.clone(), carts.clone(), notifications.clone()));
        let statistics = Arc::new(StatisticsAggregator::new(
            orders.clone(),
            ledger.clone(),
            config.low_stock_threshold,
        ));

        let identity_breaker = Arc::new(
            CircuitBreaker::new("identity", config.identity_breaker()).with_metrics(metrics.clone()),
        );
        let identity: Arc<dyn IdentityProvider> =
            Arc::new(GuardedIdentity::new(provider, identity_breaker.clone()));

        let dlq = Arc::new(DeadLetterQueue::new(metrics.clone()));
        let relay = Arc::new(
            OutboxRelay::new(
                outbox.clone(),
                order_events.clone(),
                notifications.clone(),
                dlq.clone(),
                metrics.clone(),
            )
            .with_batch_size(config.relay_batch_size),
        );

        let health = Arc::new(
            HealthMonitor::new(outbox.clone(), dlq.clone(), config.outbox_backlog_threshold)
                .with_identity_breaker(identity_breaker.clone()),
        );

        tracing::info!(
            metrics = metrics.registry().gather().len(),
            low_stock_threshold = config.low_stock_threshold,
            "🧩 Mall services wired"
        );

        Ok(Self {
            metrics,
            outbox,
            order_events,
            ledger,
            directory,
            carts,
            orders,
            invoices,
            notifications,
            checkout,
            catalog,
            statistics,
            identity,
            identity_breaker,
            dlq,
            relay,
            health,
        })
    }
}
