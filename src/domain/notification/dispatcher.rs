use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::order::{OrderStatus, PaymentStatus};
use crate::domain::shared::{format_money, Role};
use crate::metrics::Metrics;
use super::errors::{DeliveryError, NotificationError};
use super::notice::{DomainNotice, NoticeSink};
use super::value_objects::{Notification, NotificationKind, PayloadRef};

// ============================================================================
// Notification Dispatcher
// ============================================================================
//
// Turns domain notices into per-recipient records and serves the pull-based
// inbox. A (source event, recipient) pair produces at most one record, so a
// notice redelivered by the relay is harmless.
//
// ============================================================================

#[derive(Default)]
struct Inboxes {
    /// Oldest first per recipient
    by_recipient: HashMap<Uuid, Vec<Notification>>,
    delivered: HashSet<(Uuid, Uuid)>,
}

pub struct NotificationDispatcher {
    inboxes: RwLock<Inboxes>,
    metrics: Arc<Metrics>,
}

fn status_phrase(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "en attente",
        OrderStatus::Preparing => "en préparation",
        OrderStatus::Ready => "prête",
        OrderStatus::Delivered => "livrée",
        OrderStatus::Cancelled => "annulée",
        OrderStatus::Refused => "refusée",
    }
}

fn payment_phrase(status: PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Pending => "en attente",
        PaymentStatus::Paid => "reçu",
        PaymentStatus::Failed => "échoué",
        PaymentStatus::Refunded => "remboursé",
    }
}

/// One notification per recipient the notice concerns
fn compose(notice: &DomainNotice) -> Vec<Notification> {
    match notice {
        DomainNotice::OrderCreated { order_id, reference, shopper_id, vendor_id, grand_total, .. } => {
            let payload = Some(PayloadRef::Order(*order_id));
            vec![
                Notification::new(
                    *vendor_id,
                    NotificationKind::Order,
                    "Nouvelle commande",
                    format!("Nouvelle commande {reference} d'un montant de {}", format_money(*grand_total)),
                    payload,
                ),
                Notification::new(
                    *shopper_id,
                    NotificationKind::Order,
                    "Commande enregistrée",
                    format!("Votre commande {reference} a bien été enregistrée"),
                    payload,
                ),
            ]
        }

        DomainNotice::OrderStatusChanged { order_id, reference, shopper_id, vendor_id, to, actor_role, reason, .. } => {
            let payload = Some(PayloadRef::Order(*order_id));
            let mut message = format!("Votre commande {reference} est {}", status_phrase(*to));
            if let Some(reason) = reason {
                message.push_str(&format!(" ({reason})"));
            }

            let mut out = vec![Notification::new(
                *shopper_id,
                NotificationKind::Order,
                format!("Commande {reference}"),
                message,
                payload,
            )];

            if *to == OrderStatus::Cancelled && *actor_role == Role::Shopper {
                out.push(Notification::new(
                    *vendor_id,
                    NotificationKind::Order,
                    "Commande annulée",
                    format!("Le client a annulé la commande {reference}"),
                    payload,
                ));
            }
            out
        }

        DomainNotice::PaymentStatusChanged { order_id, reference, shopper_id, vendor_id, to, .. } => {
            let payload = Some(PayloadRef::Order(*order_id));
            let mut out = vec![Notification::new(
                *shopper_id,
                NotificationKind::Payment,
                format!("Paiement {reference}"),
                format!("Paiement {} pour la commande {reference}", payment_phrase(*to)),
                payload,
            )];

            if *to == PaymentStatus::Paid {
                out.push(Notification::new(
                    *vendor_id,
                    NotificationKind::Payment,
                    "Paiement reçu",
                    format!("La commande {reference} est payée"),
                    payload,
                ));
            }
            out
        }
    }
}

impl NotificationDispatcher {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            inboxes: RwLock::new(Inboxes::default()),
            metrics,
        }
    }

    /// Returns the number of notifications created (0 on redelivery)
    pub async fn dispatch(&self, notice: &DomainNotice) -> usize {
        let event_id = notice.event_id();
        let mut inboxes = self.inboxes.write().await;
        let mut created = 0;

        for notification in compose(notice) {
            if !inboxes.delivered.insert((event_id, notification.recipient_id)) {
                continue;
            }
            self.metrics.record_notification(notification.kind.as_str());
            inboxes
                .by_recipient
                .entry(notification.recipient_id)
                .or_default()
                .push(notification.from_event(event_id));
            created += 1;
        }

        if created == 0 {
            tracing::debug!(event_id = %event_id, "Notice already dispatched, skipping");
        } else {
            tracing::debug!(event_id = %event_id, order_id = %notice.order_id(), created, "Notice dispatched");
        }

        created
    }

    /// Ad-hoc notification (promotion, low stock, ...)
    pub async fn notify(
        &self,
        recipient_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        payload: Option<PayloadRef>,
    ) -> Notification {
        let notification = Notification::new(recipient_id, kind, title, message, payload);
        self.metrics.record_notification(kind.as_str());

        self.inboxes
            .write()
            .await
            .by_recipient
            .entry(recipient_id)
            .or_default()
            .push(notification.clone());

        notification
    }

    /// Newest first
    pub async fn list(&self, recipient_id: Uuid) -> Vec<Notification> {
        self.inboxes
            .read()
            .await
            .by_recipient
            .get(&recipient_id)
            .map(|inbox| inbox.iter().rev().cloned().collect())
            .unwrap_or_default()
    }

    pub async fn count_unread(&self, recipient_id: Uuid) -> usize {
        self.inboxes
            .read()
            .await
            .by_recipient
            .get(&recipient_id)
            .map(|inbox| inbox.iter().filter(|n| !n.read).count())
            .unwrap_or(0)
    }

    /// Idempotent; someone else's notification is reported as missing
    pub async fn mark_read(&self, recipient_id: Uuid, notification_id: Uuid) -> Result<Notification, NotificationError> {
        let mut inboxes = self.inboxes.write().await;
        let notification = inboxes
            .by_recipient
            .get_mut(&recipient_id)
            .and_then(|inbox| inbox.iter_mut().find(|n| n.id == notification_id))
            .ok_or(NotificationError::NotFound(notification_id))?;

        notification.mark_read(Utc::now());
        Ok(notification.clone())
    }

    /// Returns how many were unread
    pub async fn mark_all_read(&self, recipient_id: Uuid) -> usize {
        let now = Utc::now();
        let mut inboxes = self.inboxes.write().await;
        inboxes
            .by_recipient
            .get_mut(&recipient_id)
            .map(|inbox| inbox.iter_mut().map(|n| n.mark_read(now)).filter(|changed| *changed).count())
            .unwrap_or(0)
    }
}

#[async_trait]
impl NoticeSink for NotificationDispatcher {
    async fn deliver(&self, notice: &DomainNotice) -> Result<usize, DeliveryError> {
        Ok(self.dispatch(notice).await)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
