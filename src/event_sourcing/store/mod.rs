// ============================================================================
// Event Sourcing Store - Generic Persistence Layer
// ============================================================================

pub mod event_store;
pub mod outbox;

pub use event_store::{EventStore, EventStoreError};
pub use outbox::{Outbox, OutboxMessage};
