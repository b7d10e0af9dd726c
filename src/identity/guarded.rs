use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::shared::Principal;
use crate::utils::{CircuitBreaker, CircuitBreakerError};
use super::provider::{IdentityError, IdentityProvider};

// ============================================================================
// Circuit-Breaker Guarded Identity
// ============================================================================
//
// Only outages count as breaker failures. A rejected token is a successful
// call that returned a negative answer. While the breaker is open every
// verification fails fast as `Unavailable`; nothing is retried here.
//
// ============================================================================

pub struct GuardedIdentity {
    inner: Arc<dyn IdentityProvider>,
    breaker: Arc<CircuitBreaker>,
}

impl GuardedIdentity {
    pub fn new(inner: Arc<dyn IdentityProvider>, breaker: Arc<CircuitBreaker>) -> Self {
        Self { inner, breaker }
    }

    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }
}

#[async_trait]
impl IdentityProvider for GuardedIdentity {
    async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
        let outcome = self
            .breaker
            .call(async {
                match self.inner.verify(token).await {
                    Err(IdentityError::Unavailable(reason)) => Err(reason),
                    answer => Ok(answer),
                }
            })
            .await;

        match outcome {
            Ok(answer) => answer,
            Err(CircuitBreakerError::CircuitOpen) => {
                tracing::warn!(breaker = self.breaker.name(), "Identity check rejected: circuit open");
                Err(IdentityError::Unavailable("circuit breaker open".into()))
            }
            Err(CircuitBreakerError::OperationFailed(reason)) => Err(IdentityError::Unavailable(reason)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{CircuitBreakerConfig, CircuitState};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    struct Flaky {
        down: AtomicBool,
        user: Principal,
    }

    #[async_trait]
    impl IdentityProvider for Flaky {
        async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(IdentityError::Unavailable("connection refused".into()));
            }
            if token == "good" {
                Ok(self.user)
            } else {
                Err(IdentityError::InvalidToken)
            }
        }
    }

    fn guarded(down: bool) -> (GuardedIdentity, Arc<Flaky>) {
        let flaky = Arc::new(Flaky {
            down: AtomicBool::new(down),
            user: Principal::shopper(Uuid::new_v4()),
        });
        let breaker = Arc::new(CircuitBreaker::new(
            "identity",
            CircuitBreakerConfig {
                failure_threshold: 2,
                open_timeout: Duration::from_secs(60),
                success_threshold: 1,
            },
        ));
        (GuardedIdentity::new(flaky.clone(), breaker), flaky)
    }

    #[tokio::test]
    async fn bad_tokens_do_not_trip_the_breaker() {
        let (identity, _) = guarded(false);
        for _ in 0..5 {
            assert_eq!(identity.verify("bad").await, Err(IdentityError::InvalidToken));
        }
        assert_eq!(identity.breaker().state().await, CircuitState::Closed);
        assert!(identity.verify("good").await.is_ok());
    }

    #[tokio::test]
    async fn outages_open_the_breaker_and_fail_fast() {
        let (identity, flaky) = guarded(true);
        for _ in 0..2 {
            assert!(matches!(identity.verify("good").await, Err(IdentityError::Unavailable(_))));
        }
        assert_eq!(identity.breaker().state().await, CircuitState::Open);

        flaky.down.store(false, Ordering::SeqCst);
        assert_eq!(
            identity.verify("good").await,
            Err(IdentityError::Unavailable("circuit breaker open".into()))
        );
    }
}
