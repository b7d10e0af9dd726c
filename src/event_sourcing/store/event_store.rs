use std::collections::HashMap;
use std::sync::Arc;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::event_sourcing::core::{Aggregate, DomainEvent, EventEnvelope, serialize_event};
use super::outbox::{Outbox, OutboxMessage};

// ============================================================================
// Generic Event Store - Repository for Events
// ============================================================================
//
// Responsibilities:
// 1. Append events to per-aggregate streams (append-only)
// 2. Load event history for aggregates
// 3. Optimistic concurrency control on the stream version
// 4. Write to the outbox in the same critical section
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EventStoreError {
    #[error("Cannot append an empty event list")]
    EmptyAppend,

    #[error("Concurrency conflict on {aggregate_id}: expected version {expected}, current is {actual}")]
    ConcurrencyConflict {
        aggregate_id: Uuid,
        expected: i64,
        actual: i64,
    },

    #[error("Sequence gap on {aggregate_id}: expected {expected}, got {got}")]
    SequenceGap {
        aggregate_id: Uuid,
        expected: i64,
        got: i64,
    },

    #[error("Aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    #[error("Event serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to replay aggregate {aggregate_id}: {reason}")]
    Replay { aggregate_id: Uuid, reason: String },
}

struct Streams<E> {
    by_aggregate: HashMap<Uuid, Vec<EventEnvelope<E>>>,
    creation_order: Vec<Uuid>,
}

pub struct EventStore<E: DomainEvent> {
    streams: RwLock<Streams<E>>,
    outbox: Arc<Outbox>,
    aggregate_type_name: String, // e.g. "Order"
    topic_name: String,          // e.g. "order-events"
}

impl<E: DomainEvent> EventStore<E> {
    pub fn new(outbox: Arc<Outbox>, aggregate_type_name: &str, topic_name: &str) -> Self {
        Self {
            streams: RwLock::new(Streams {
                by_aggregate: HashMap::new(),
                creation_order: Vec::new(),
            }),
            outbox,
            aggregate_type_name: aggregate_type_name.to_string(),
            topic_name: topic_name.to_string(),
        }
    }

    /// Append events to a stream; returns the new version
    pub async fn append_events(
        &self,
        aggregate_id: Uuid,
        expected_version: i64,
        events: Vec<EventEnvelope<E>>,
        publish_to_outbox: bool,
    ) -> Result<i64, EventStoreError> {
        if events.is_empty() {
            return Err(EventStoreError::EmptyAppend);
        }

        let mut streams = self.streams.write().await;

        let current_version = Self::version_of(&streams, aggregate_id);
        if current_version != expected_version {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: expected_version,
                actual: current_version,
            });
        }

        // Validate and serialize everything before touching the stream
        let mut outbox_messages = Vec::new();
        let mut next = expected_version;
        for envelope in &events {
            next += 1;
            if envelope.sequence_number != next {
                return Err(EventStoreError::SequenceGap {
                    aggregate_id,
                    expected: next,
                    got: envelope.sequence_number,
                });
            }

            if publish_to_outbox {
                outbox_messages.push(OutboxMessage {
                    id: Uuid::now_v7(),
                    aggregate_id,
                    aggregate_type: self.aggregate_type_name.clone(),
                    event_id: envelope.event_id,
                    event_type: envelope.event_type.clone(),
                    event_version: envelope.event_version,
                    payload: serialize_event(&envelope.event_data)?,
                    topic: self.topic_name.clone(),
                    correlation_id: envelope.correlation_id,
                    created_at: Utc::now(),
                    attempts: 0,
                });
            }
        }

        let event_count = events.len();
        if expected_version == 0 {
            streams.creation_order.push(aggregate_id);
        }
        streams.by_aggregate.entry(aggregate_id).or_default().extend(events);

        if !outbox_messages.is_empty() {
            self.outbox.enqueue(outbox_messages).await;
        }

        tracing::debug!(
            aggregate_id = %aggregate_id,
            aggregate_type = %self.aggregate_type_name,
            new_version = next,
            event_count = event_count,
            "Appended events to event store"
        );

        Ok(next)
    }

    pub async fn load_events(&self, aggregate_id: Uuid) -> Vec<EventEnvelope<E>> {
        let streams = self.streams.read().await;
        streams.by_aggregate.get(&aggregate_id).cloned().unwrap_or_default()
    }

    pub async fn get_current_version(&self, aggregate_id: Uuid) -> i64 {
        let streams = self.streams.read().await;
        Self::version_of(&streams, aggregate_id)
    }

    pub async fn aggregate_exists(&self, aggregate_id: Uuid) -> bool {
        self.get_current_version(aggregate_id).await > 0
    }

    /// Aggregate ids in creation order
    pub async fn aggregate_ids(&self) -> Vec<Uuid> {
        self.streams.read().await.creation_order.clone()
    }

    pub async fn load_aggregate<A>(&self, aggregate_id: Uuid) -> Result<A, EventStoreError>
    where
        A: Aggregate<Event = E>,
    {
        let events = self.load_events(aggregate_id).await;
        Self::replay(aggregate_id, &events)
    }

    /// Replay every stream, in creation order
    pub async fn load_all<A>(&self) -> Result<Vec<A>, EventStoreError>
    where
        A: Aggregate<Event = E>,
    {
        let streams = self.streams.read().await;
        streams
            .creation_order
            .iter()
            .map(|id| {
                let events = streams.by_aggregate.get(id).map(Vec::as_slice).unwrap_or_default();
                Self::replay(*id, events)
            })
            .collect()
    }

    fn replay<A>(aggregate_id: Uuid, events: &[EventEnvelope<E>]) -> Result<A, EventStoreError>
    where
        A: Aggregate<Event = E>,
    {
        A::load_from_events(events)
            .map_err(|e| EventStoreError::Replay {
                aggregate_id,
                reason: e.to_string(),
            })?
            .ok_or(EventStoreError::AggregateNotFound(aggregate_id))
    }

    fn version_of(streams: &Streams<E>, aggregate_id: Uuid) -> i64 {
        streams
            .by_aggregate
            .get(&aggregate_id)
            .and_then(|events| events.last())
            .map(|last| last.sequence_number)
            .unwrap_or(0)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug)]
    #[serde(tag = "type", content = "data")]
    enum TallyEvent {
        Opened { id: Uuid },
        Bumped { by: u32 },
    }

    impl DomainEvent for TallyEvent {
        fn event_type(&self) -> &'static str {
            match self {
                TallyEvent::Opened { .. } => "TallyOpened",
                TallyEvent::Bumped { .. } => "TallyBumped",
            }
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("tally error")]
    struct TallyError;

    struct Tally {
        id: Uuid,
        total: u32,
        version: i64,
    }

    impl Aggregate for Tally {
        type Event = TallyEvent;
        type Command = ();
        type Error = TallyError;

        fn initiate(_: &()) -> Result<Vec<TallyEvent>, TallyError> {
            Err(TallyError)
        }

        fn apply_first_event(event: &TallyEvent) -> Result<Self, TallyError> {
            match event {
                TallyEvent::Opened { id } => Ok(Self { id: *id, total: 0, version: 0 }),
                _ => Err(TallyError),
            }
        }

        fn apply_event(&mut self, event: &TallyEvent) -> Result<(), TallyError> {
            if let TallyEvent::Bumped { by } = event {
                self.total += by;
            }
            Ok(())
        }

        fn handle_command(&self, _: &()) -> Result<Vec<TallyEvent>, TallyError> {
            Ok(vec![])
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn version(&self) -> i64 {
            self.version
        }

        fn set_version(&mut self, version: i64) {
            self.version = version;
        }
    }

    fn store() -> (EventStore<TallyEvent>, Arc<Outbox>) {
        let outbox = Arc::new(Outbox::new());
        (EventStore::new(outbox.clone(), "Tally", "tally-events"), outbox)
    }

    #[tokio::test]
    async fn append_then_replay() {
        let (store, outbox) = store();
        let id = Uuid::new_v4();
        let correlation = Uuid::new_v4();

        let version = store
            .append_events(
                id,
                0,
                vec![
                    EventEnvelope::new(id, 1, TallyEvent::Opened { id }, correlation),
                    EventEnvelope::new(id, 2, TallyEvent::Bumped { by: 4 }, correlation),
                ],
                true,
            )
            .await
            .unwrap();

        assert_eq!(version, 2);
        assert!(store.aggregate_exists(id).await);
        assert_eq!(outbox.len().await, 2);

        let tally: Tally = store.load_aggregate(id).await.unwrap();
        assert_eq!(tally.total, 4);
        assert_eq!(tally.version(), 2);
    }

    #[tokio::test]
    async fn stale_writer_is_rejected() {
        let (store, outbox) = store();
        let id = Uuid::new_v4();
        let correlation = Uuid::new_v4();

        store
            .append_events(id, 0, vec![EventEnvelope::new(id, 1, TallyEvent::Opened { id }, correlation)], false)
            .await
            .unwrap();

        let result = store
            .append_events(id, 0, vec![EventEnvelope::new(id, 1, TallyEvent::Bumped { by: 1 }, correlation)], true)
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { expected: 0, actual: 1, .. })
        ));
        assert!(outbox.is_empty().await);
    }

    #[tokio::test]
    async fn gaps_in_sequence_are_rejected() {
        let (store, _) = store();
        let id = Uuid::new_v4();

        let result = store
            .append_events(id, 0, vec![EventEnvelope::new(id, 2, TallyEvent::Opened { id }, Uuid::new_v4())], false)
            .await;

        assert!(matches!(result, Err(EventStoreError::SequenceGap { expected: 1, got: 2, .. })));
        assert!(!store.aggregate_exists(id).await);
    }

    #[tokio::test]
    async fn load_all_keeps_creation_order() {
        let (store, _) = store();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        for id in &ids {
            store
                .append_events(*id, 0, vec![EventEnvelope::new(*id, 1, TallyEvent::Opened { id: *id }, Uuid::new_v4())], false)
                .await
                .unwrap();
        }

        let tallies: Vec<Tally> = store.load_all().await.unwrap();
        let loaded: Vec<Uuid> = tallies.iter().map(|t| t.id).collect();
        assert_eq!(loaded, ids);
        assert_eq!(store.aggregate_ids().await, ids);
    }

    #[tokio::test]
    async fn missing_aggregate_is_reported() {
        let (store, _) = store();
        let result: Result<Tally, _> = store.load_aggregate(Uuid::new_v4()).await;
        assert!(matches!(result, Err(EventStoreError::AggregateNotFound(_))));
    }
}
