use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::shared::{Identified, Reference};

// ============================================================================
// Party Directory
// ============================================================================
//
// Display profiles for boutiques and shoppers. Documents hold a
// `Reference<PartyProfile>`: resolved when the directory knows the party,
// the bare id otherwise.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Boutique,
    Shopper,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyProfile {
    pub id: Uuid,
    pub kind: PartyKind,
    pub display_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl PartyProfile {
    pub fn new(id: Uuid, kind: PartyKind, display_name: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            display_name: display_name.into(),
            email: None,
            phone: None,
            address: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

impl Identified for PartyProfile {
    fn id(&self) -> Uuid {
        self.id
    }
}

#[derive(Default)]
pub struct PartyDirectory {
    profiles: RwLock<HashMap<Uuid, PartyProfile>>,
}

impl PartyDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace
    pub async fn register(&self, profile: PartyProfile) {
        self.profiles.write().await.insert(profile.id, profile);
    }

    pub async fn profile(&self, id: Uuid) -> Option<PartyProfile> {
        self.profiles.read().await.get(&id).cloned()
    }

    pub async fn resolve(&self, id: Uuid) -> Reference<PartyProfile> {
        match self.profile(id).await {
            Some(profile) => Reference::Resolved(profile),
            None => Reference::Id(id),
        }
    }

    pub async fn ids_of_kind(&self, kind: PartyKind) -> Vec<Uuid> {
        self.profiles
            .read()
            .await
            .values()
            .filter(|p| p.kind == kind)
            .map(|p| p.id)
            .collect()
    }
}
