use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::shared::{Money, Role};

// ============================================================================
// Order Value Objects
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "en_attente")]
    Pending,
    #[serde(rename = "en_preparation")]
    Preparing,
    #[serde(rename = "pret")]
    Ready,
    #[serde(rename = "livre")]
    Delivered,
    #[serde(rename = "annule")]
    Cancelled,
    #[serde(rename = "refuse")]
    Refused,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 6] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
        OrderStatus::Refused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "en_attente",
            OrderStatus::Preparing => "en_preparation",
            OrderStatus::Ready => "pret",
            OrderStatus::Delivered => "livre",
            OrderStatus::Cancelled => "annule",
            OrderStatus::Refused => "refuse",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refused)
    }

    /// Cancelled or refused
    pub fn is_voided(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Refused)
    }

    /// Transition table, independent of who asks
    pub fn can_transition_to(&self, target: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            (Pending, Preparing)
                | (Preparing, Ready)
                | (Ready, Delivered)
                | (Pending, Cancelled)
                | (Preparing, Cancelled)
                | (Pending, Refused)
                | (Preparing, Refused)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    #[serde(rename = "en_attente")]
    Pending,
    #[serde(rename = "paye")]
    Paid,
    #[serde(rename = "echoue")]
    Failed,
    #[serde(rename = "rembourse")]
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "en_attente",
            PaymentStatus::Paid => "paye",
            PaymentStatus::Failed => "echoue",
            PaymentStatus::Refunded => "rembourse",
        }
    }

    pub fn can_transition_to(&self, target: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!((self, target), (Pending, Paid) | (Pending, Failed) | (Paid, Refunded))
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryMode {
    #[serde(rename = "retrait_boutique")]
    StorePickup,
    #[serde(rename = "livraison_standard")]
    Standard,
    #[serde(rename = "livraison_express")]
    Express,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::StorePickup => "retrait_boutique",
            DeliveryMode::Standard => "livraison_standard",
            DeliveryMode::Express => "livraison_express",
        }
    }

    pub fn requires_address(&self) -> bool {
        !matches!(self, DeliveryMode::StorePickup)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "carte_bancaire")]
    DebitCard,
    #[serde(rename = "carte_credit")]
    CreditCard,
    #[serde(rename = "mobile")]
    Mobile,
    #[serde(rename = "virement")]
    BankTransfer,
    #[serde(rename = "especes")]
    Cash,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::DebitCard => "carte_bancaire",
            PaymentMethod::CreditCard => "carte_credit",
            PaymentMethod::Mobile => "mobile",
            PaymentMethod::BankTransfer => "virement",
            PaymentMethod::Cash => "especes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryAddress {
    pub recipient_name: String,
    pub phone: String,
    pub street: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub instructions: Option<String>,
}

impl DeliveryAddress {
    /// Names of the required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("recipientName", &self.recipient_name),
            ("phone", &self.phone),
            ("street", &self.street),
            ("city", &self.city),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Delivery fee charged per order, by mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFees {
    pub store_pickup: Money,
    pub standard: Money,
    pub express: Money,
}

impl Default for DeliveryFees {
    fn default() -> Self {
        Self {
            store_pickup: Decimal::ZERO,
            standard: Decimal::new(500, 2),
            express: Decimal::new(1000, 2),
        }
    }
}

impl DeliveryFees {
    pub fn fee_for(&self, mode: DeliveryMode) -> Money {
        match mode {
            DeliveryMode::StorePickup => self.store_pickup,
            DeliveryMode::Standard => self.standard,
            DeliveryMode::Express => self.express,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: u32,
    /// Frozen at order creation
    pub unit_price: Money,
    pub line_total: Money,
}

impl OrderLine {
    pub fn new(product_id: Uuid, product_name: impl Into<String>, quantity: u32, unit_price: Money) -> Self {
        Self {
            product_id,
            product_name: product_name.into(),
            quantity,
            unit_price,
            line_total: unit_price * Decimal::from(quantity),
        }
    }
}

/// Human readable sequential reference, e.g. `CMD-000042`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderReference(String);

impl OrderReference {
    pub fn from_sequence(sequence: u64) -> Self {
        Self(format!("CMD-{sequence:06}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `FAC-000042` for `CMD-000042`
    pub fn invoice_number(&self) -> String {
        match self.0.strip_prefix("CMD-") {
            Some(suffix) => format!("FAC-{suffix}"),
            None => format!("FAC-{}", self.0),
        }
    }
}

impl fmt::Display for OrderReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusHistoryEntry {
    pub status: OrderStatus,
    pub actor_role: Role,
    pub actor_id: Option<Uuid>,
    pub at: DateTime<Utc>,
    pub reason: Option<String>,
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_path_and_side_branches() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Delivered));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Preparing.can_transition_to(Refused));

        assert!(!Pending.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Cancelled));
        assert!(!Cancelled.can_transition_to(Cancelled));
    }

    #[test]
    fn terminal_states_lead_nowhere() {
        for terminal in OrderStatus::ALL.iter().filter(|s| s.is_terminal()) {
            for target in OrderStatus::ALL {
                assert!(!terminal.can_transition_to(target));
            }
        }
    }

    #[test]
    fn payment_table() {
        use PaymentStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Paid.can_transition_to(Refunded));
        assert!(!Failed.can_transition_to(Paid));
        assert!(!Pending.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Paid));
    }

    #[test]
    fn wire_names_are_french() {
        assert_eq!(serde_json::to_string(&OrderStatus::Preparing).unwrap(), "\"en_preparation\"");
        assert_eq!(serde_json::to_string(&PaymentStatus::Refunded).unwrap(), "\"rembourse\"");
        assert_eq!(
            serde_json::from_str::<DeliveryMode>("\"livraison_express\"").unwrap(),
            DeliveryMode::Express
        );
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"virement\"").unwrap(),
            PaymentMethod::BankTransfer
        );
    }

    #[test]
    fn references_and_invoice_numbers() {
        let reference = OrderReference::from_sequence(42);
        assert_eq!(reference.as_str(), "CMD-000042");
        assert_eq!(reference.invoice_number(), "FAC-000042");
    }

    #[test]
    fn default_fees_per_mode() {
        let fees = DeliveryFees::default();
        assert_eq!(fees.fee_for(DeliveryMode::StorePickup), Decimal::ZERO);
        assert_eq!(fees.fee_for(DeliveryMode::Standard), Decimal::new(5, 0));
        assert_eq!(fees.fee_for(DeliveryMode::Express), Decimal::new(10, 0));
    }

    #[test]
    fn blank_address_fields_are_listed() {
        let address = DeliveryAddress {
            recipient_name: "Awa".into(),
            phone: " ".into(),
            street: "12 rue des Lilas".into(),
            city: String::new(),
            postal_code: None,
            instructions: None,
        };
        assert_eq!(address.missing_fields(), vec!["phone", "city"]);
    }
}
