// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Cart → Checkout → (Inventory, Order) → Notification
// Order transitions → (Inventory on void, Invoice on delivery)
// Statistics only reads committed orders and products.
//
// The event sourcing infrastructure knows nothing about these modules.
//
// ============================================================================

pub mod shared;
pub mod directory;
pub mod inventory;
pub mod cart;
pub mod order;
pub mod invoice;
pub mod notification;
pub mod checkout;
pub mod catalog;
pub mod statistics;
