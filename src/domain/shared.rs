use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Shared Value Objects
// ============================================================================

/// Single implicit currency
pub type Money = Decimal;

/// Two decimals, half away from zero
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn format_money(amount: Money) -> String {
    format!("{:.2}", round_money(amount))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "client")]
    Shopper,
    #[serde(rename = "boutique")]
    Vendor,
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Shopper => "client",
            Role::Vendor => "boutique",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "client" | "shopper" => Ok(Role::Shopper),
            "boutique" | "vendor" => Ok(Role::Vendor),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Verified caller identity, as returned by the identity service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn shopper(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Shopper)
    }

    pub fn vendor(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Vendor)
    }

    pub fn admin(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Admin)
    }
}

pub trait Identified {
    fn id(&self) -> Uuid;
}

/// Either a bare id or the resolved entity; resolved at the read boundary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum Reference<T> {
    Id(Uuid),
    Resolved(T),
}

impl<T: Identified> Reference<T> {
    pub fn id(&self) -> Uuid {
        match self {
            Reference::Id(id) => *id,
            Reference::Resolved(entity) => entity.id(),
        }
    }

    pub fn resolved(&self) -> Option<&T> {
        match self {
            Reference::Id(_) => None,
            Reference::Resolved(entity) => Some(entity),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Reference::Resolved(_))
    }
}
