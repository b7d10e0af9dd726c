use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tokio::sync::Mutex;
use uuid::Uuid;

// ============================================================================
// Transactional Outbox
// ============================================================================
//
// Written by the event store in the same critical section as the events, read
// by the outbox relay. Payloads stay JSON so the relay decodes them exactly as
// a remote consumer would.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxMessage {
    pub id: Uuid,
    pub aggregate_id: Uuid,
    pub aggregate_type: String,
    pub event_id: Uuid,
    pub event_type: String,
    pub event_version: i32,
    pub payload: String,
    pub topic: String,
    pub correlation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub attempts: u32,
}

#[derive(Debug, Default)]
pub struct Outbox {
    pending: Mutex<VecDeque<OutboxMessage>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn enqueue(&self, messages: Vec<OutboxMessage>) {
        let mut pending = self.pending.lock().await;
        pending.extend(messages);
    }

    /// Remove up to `max` messages, oldest first
    pub async fn take_batch(&self, max: usize) -> Vec<OutboxMessage> {
        let mut pending = self.pending.lock().await;
        let count = max.min(pending.len());
        pending.drain(..count).collect()
    }

    pub async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.pending.lock().await.is_empty()
    }
}
