pub mod cart;
pub mod checkout;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod stats;
