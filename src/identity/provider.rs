use async_trait::async_trait;
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::shared::{Principal, Role};

// ============================================================================
// Identity Provider
// ============================================================================

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IdentityError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Invalid or unknown token")]
    InvalidToken,

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid identity configuration: {0}")]
    InvalidConfig(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Principal, IdentityError>;
}

/// Fixed token table, configured as `token:role:uuid` entries separated by commas
#[derive(Debug, Clone, Default)]
pub struct StaticTokenIdentity {
    tokens: HashMap<String, Principal>,
}

impl StaticTokenIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>, principal: Principal) -> Self {
        self.tokens.insert(token.into(), principal);
        self
    }

    pub fn parse(entries: &str) -> Result<Self, IdentityError> {
        let mut identity = Self::new();

        for entry in entries.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let mut parts = entry.splitn(3, ':');
            let (Some(token), Some(role), Some(user_id)) = (parts.next(), parts.next(), parts.next()) else {
                return Err(IdentityError::InvalidConfig(format!("expected token:role:uuid, got '{entry}'")));
            };

            let role: Role = role.parse().map_err(IdentityError::InvalidConfig)?;
            let user_id = Uuid::parse_str(user_id.trim())
                .map_err(|e| IdentityError::InvalidConfig(format!("bad user id in '{entry}': {e}")))?;

            identity.tokens.insert(token.trim().to_string(), Principal::new(user_id, role));
        }

        Ok(identity)
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityProvider for StaticTokenIdentity {
    async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
        if token.trim().is_empty() {
            return Err(IdentityError::MissingCredentials);
        }
        self.tokens.get(token).copied().ok_or(IdentityError::InvalidToken)
    }
}
