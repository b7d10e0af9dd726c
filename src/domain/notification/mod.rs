// ============================================================================
// Notification Domain - Per-recipient inbox fed by domain notices
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod notice;
pub mod dispatcher;

pub use value_objects::*;
pub use errors::*;
pub use notice::*;
pub use dispatcher::*;
