// ============================================================================
// Order Domain - Vendor-scoped orders and their lifecycle
// ============================================================================
//
// - Value objects (OrderLine, OrderStatus, PaymentStatus, DeliveryMode, ...)
// - Events (OrderCreated, OrderStatusChanged, PaymentStatusChanged)
// - Commands (PlaceOrder, ChangeStatus, RecordPayment)
// - Aggregate (role-gated status machine, independent payment machine)
// - Command handler (persistence, per-order locking, side effects)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod command_handler;

pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use command_handler::*;
