use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::event_sourcing::store::Outbox;
use crate::relay::DeadLetterQueue;
use crate::utils::{CircuitBreaker, CircuitState};

// ============================================================================
// Health Reporting
// ============================================================================
//
// Components report Healthy / Degraded / Unhealthy; the worst one decides the
// overall status. Checked on demand by the /health endpoint.
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

impl HealthStatus {
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, HealthStatus::Unhealthy(_))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ComponentHealth {
    pub fn new(name: impl Into<String>, status: HealthStatus) -> Self {
        Self {
            name: name.into(),
            status,
            last_check: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: BTreeMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

impl SystemHealth {
    pub fn from_components(components: Vec<ComponentHealth>) -> Self {
        let mut unhealthy = Vec::new();
        let mut degraded = false;

        for component in &components {
            match &component.status {
                HealthStatus::Unhealthy(reason) => unhealthy.push(format!("{}: {}", component.name, reason)),
                HealthStatus::Degraded(_) => degraded = true,
                HealthStatus::Healthy => {}
            }
        }

        let overall_status = if !unhealthy.is_empty() {
            HealthStatus::Unhealthy(unhealthy.join(", "))
        } else if degraded {
            HealthStatus::Degraded("Some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        };

        Self {
            overall_status,
            components: components.into_iter().map(|c| (c.name.clone(), c)).collect(),
            check_time: Utc::now(),
        }
    }
}

pub struct HealthMonitor {
    outbox: Arc<Outbox>,
    dlq: Arc<DeadLetterQueue>,
    identity_breaker: Option<Arc<CircuitBreaker>>,
    /// Outbox backlog above this is reported as degraded
    backlog_threshold: usize,
}

impl HealthMonitor {
    pub fn new(outbox: Arc<Outbox>, dlq: Arc<DeadLetterQueue>, backlog_threshold: usize) -> Self {
        Self {
            outbox,
            dlq,
            identity_breaker: None,
            backlog_threshold,
        }
    }

    pub fn with_identity_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.identity_breaker = Some(breaker);
        self
    }

    pub async fn check(&self) -> SystemHealth {
        let mut components = Vec::with_capacity(3);

        let backlog = self.outbox.len().await;
        let status = if backlog > self.backlog_threshold {
            HealthStatus::Degraded(format!("{backlog} messages waiting"))
        } else {
            HealthStatus::Healthy
        };
        components.push(ComponentHealth::new("outbox", status).with_details(format!("backlog={backlog}")));

        let dead = self.dlq.len().await;
        let status = if dead > 0 {
            HealthStatus::Degraded(format!("{dead} dead letters"))
        } else {
            HealthStatus::Healthy
        };
        components.push(ComponentHealth::new("dead_letter_queue", status));

        if let Some(breaker) = &self.identity_breaker {
            let status = match breaker.state().await {
                CircuitState::Closed => HealthStatus::Healthy,
                CircuitState::HalfOpen => HealthStatus::Degraded("Circuit breaker half-open".to_string()),
                CircuitState::Open => HealthStatus::Unhealthy("Circuit breaker open".to_string()),
            };
            components.push(ComponentHealth::new("identity", status));
        }

        SystemHealth::from_components(components)
    }
}
