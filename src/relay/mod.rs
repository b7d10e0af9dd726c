// ============================================================================
// Outbox Relay - Delivers committed order events to notification sinks
// ============================================================================

pub mod dlq;
pub mod outbox_relay;

pub use dlq::*;
pub use outbox_relay::*;
