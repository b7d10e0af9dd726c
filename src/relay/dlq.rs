use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::store::OutboxMessage;
use crate::metrics::Metrics;

// ============================================================================
// Dead Letter Queue
// ============================================================================
//
// Outbox messages the relay could not deliver: undecodable payloads, orders
// that cannot be replayed, sinks that kept failing. Kept for inspection;
// nothing re-drives them automatically.
//
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadLetter {
    pub id: Uuid,
    pub outbox_id: Uuid,
    pub aggregate_id: Uuid,
    pub event_id: Uuid,
    pub event_type: String,
    pub payload: String,
    pub error_message: String,
    pub failure_count: u32,
    pub first_failed_at: DateTime<Utc>,
    pub last_failed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DlqStats {
    pub total_messages: usize,
    pub by_event_type: BTreeMap<String, usize>,
}

pub struct DeadLetterQueue {
    messages: RwLock<Vec<DeadLetter>>,
    metrics: Arc<Metrics>,
}

impl DeadLetterQueue {
    pub fn new(metrics: Arc<Metrics>) -> Self {
        Self {
            messages: RwLock::new(Vec::new()),
            metrics,
        }
    }

    pub async fn add(&self, message: &OutboxMessage, error_message: impl Into<String>, failure_count: u32) {
        let error_message = error_message.into();
        let now = Utc::now();

        tracing::error!(
            event_id = %message.event_id,
            event_type = %message.event_type,
            aggregate_id = %message.aggregate_id,
            error = %error_message,
            failure_count,
            "💀 Adding message to Dead Letter Queue"
        );

        self.metrics.record_dlq_message(&message.event_type);
        self.messages.write().await.push(DeadLetter {
            id: Uuid::now_v7(),
            outbox_id: message.id,
            aggregate_id: message.aggregate_id,
            event_id: message.event_id,
            event_type: message.event_type.clone(),
            payload: message.payload.clone(),
            error_message,
            failure_count,
            first_failed_at: message.created_at.min(now),
            last_failed_at: now,
        });
    }

    /// Oldest first
    pub async fn list(&self, limit: usize) -> Vec<DeadLetter> {
        self.messages.read().await.iter().take(limit).cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }

    pub async fn stats(&self) -> DlqStats {
        let messages = self.messages.read().await;
        let mut by_event_type = BTreeMap::new();
        for message in messages.iter() {
            *by_event_type.entry(message.event_type.clone()).or_insert(0) += 1;
        }
        DlqStats {
            total_messages: messages.len(),
            by_event_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(event_type: &str) -> OutboxMessage {
        OutboxMessage {
            id: Uuid::now_v7(),
            aggregate_id: Uuid::new_v4(),
            aggregate_type: "Order".into(),
            event_id: Uuid::now_v7(),
            event_type: event_type.into(),
            event_version: 1,
            payload: "{}".into(),
            topic: "order-events".into(),
            correlation_id: Uuid::now_v7(),
            created_at: Utc::now(),
            attempts: 0,
        }
    }

    #[tokio::test]
    async fn stats_group_by_event_type() {
        let dlq = DeadLetterQueue::new(Arc::new(Metrics::new().unwrap()));
        dlq.add(&message("OrderCreated"), "boom", 3).await;
        dlq.add(&message("OrderCreated"), "boom", 3).await;
        dlq.add(&message("OrderStatusChanged"), "bad payload", 1).await;

        let stats = dlq.stats().await;
        assert_eq!(stats.total_messages, 3);
        assert_eq!(stats.by_event_type["OrderCreated"], 2);
        assert_eq!(stats.by_event_type["OrderStatusChanged"], 1);
        assert_eq!(dlq.list(2).await.len(), 2);
        assert_eq!(dlq.list(10).await[2].error_message, "bad payload");
    }
}
