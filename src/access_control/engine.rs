//! Authorization engine
//!
//! Owns the current [`RuleChain`] behind an atomically swappable pointer and
//! the two providers. Each evaluation takes one snapshot of the chain up
//! front, so a concurrent [`swap_chain`](AuthorizationEngine::swap_chain)
//! is seen either entirely or not at all.

use crate::access_control::chain::RuleChain;
use crate::access_control::context::AuthorizationContext;
use crate::access_control::stats::DecisionStats;
use crate::access_control::types::{AuthRequest, Decision};
use crate::auth::{SharedPermissionProvider, SharedSessionProvider};
use crate::config::EngineConfig;
use crate::error::{Denial, ProviderError};
use arc_swap::ArcSwap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

pub struct AuthorizationEngine {
    chain: ArcSwap<RuleChain>,
    session: SharedSessionProvider,
    permissions: SharedPermissionProvider,
    timeout: Option<Duration>,
    stats: Arc<DecisionStats>,
}

impl AuthorizationEngine {
    /// Create an engine with no evaluation timeout
    pub fn new(
        chain: RuleChain,
        session: SharedSessionProvider,
        permissions: SharedPermissionProvider,
    ) -> Self {
        info!(
            rules = chain.len(),
            session_provider = session.provider_type(),
            permission_provider = permissions.provider_type(),
            "Initialized authorization engine"
        );

        Self {
            chain: ArcSwap::from_pointee(chain),
            session,
            permissions,
            timeout: None,
            stats: Arc::new(DecisionStats::new()),
        }
    }

    /// Bound the total time one evaluation may spend
    ///
    /// On expiry the in-flight provider calls are dropped and the request is
    /// denied with `PROVIDER_ERROR`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Apply the `[engine]` configuration section
    pub fn with_config(self, config: &EngineConfig) -> Self {
        match config.timeout() {
            Some(timeout) => self.with_timeout(timeout),
            None => self,
        }
    }

    /// Current chain snapshot
    pub fn chain(&self) -> Arc<RuleChain> {
        self.chain.load_full()
    }

    /// Atomically replace the chain, returning the previous one
    ///
    /// Evaluations already in flight finish on the chain they started with.
    pub fn swap_chain(&self, chain: RuleChain) -> Arc<RuleChain> {
        let rules = chain.len();
        let previous = self.chain.swap(Arc::new(chain));
        info!(previous = previous.len(), rules, "Swapped rule chain");
        previous
    }

    pub fn stats(&self) -> &Arc<DecisionStats> {
        &self.stats
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Evaluate a path and optional token
    pub async fn evaluate(&self, path: &str, token: Option<&str>) -> Decision {
        self.evaluate_request(AuthRequest::new(path).token(token))
            .await
    }

    /// Evaluate a request
    #[instrument(skip_all, fields(path = request.path, method = request.method))]
    pub async fn evaluate_request(&self, request: AuthRequest<'_>) -> Decision {
        let chain = self.chain.load_full();
        let ctx = AuthorizationContext::new(request, self.session.clone(), self.permissions.clone());

        let decision = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, chain.evaluate(&ctx)).await {
                Ok(decision) => decision,
                Err(_) => {
                    let error = ProviderError::Timeout {
                        timeout_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                    };
                    warn!(error = %error, "Authorization timed out, denying");
                    Decision::Deny(Denial::provider_error(&error))
                }
            },
            None => chain.evaluate(&ctx).await,
        };

        self.stats.record(&decision);
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::checks::{LoginCheck, check_fn};
    use crate::access_control::rule::Rule;
    use crate::access_control::types::ReasonCode;
    use crate::auth::InMemoryIdentityStore;

    fn engine(chain: RuleChain) -> AuthorizationEngine {
        let store = Arc::new(InMemoryIdentityStore::new().with_user(
            "1",
            "tok",
            ["user"],
            Vec::<String>::new(),
        ));
        AuthorizationEngine::new(chain, store.clone(), store)
    }

    #[tokio::test]
    async fn test_timeout_denies_with_provider_error() {
        let slow = Rule::builder(check_fn("slow", |_| {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(Decision::Allow)
            })
        }))
        .build()
        .unwrap();

        let engine = engine(RuleChain::new(vec![slow])).with_timeout(Duration::from_millis(20));
        let decision = engine.evaluate("/x", Some("tok")).await;

        assert_eq!(decision.reason(), Some(ReasonCode::ProviderError));
        assert_eq!(engine.stats().snapshot().denied.provider_error, 1);
    }

    #[tokio::test]
    async fn test_swap_chain_returns_previous() {
        let engine = engine(RuleChain::default());
        assert!(engine.evaluate("/x", None).await.is_allowed());

        let login = RuleChain::new(vec![Rule::builder(LoginCheck).build().unwrap()]);
        let previous = engine.swap_chain(login);
        assert!(previous.is_empty());
        assert_eq!(engine.chain().len(), 1);

        assert_eq!(
            engine.evaluate("/x", None).await.reason(),
            Some(ReasonCode::NotLogin)
        );
        assert!(engine.evaluate("/x", Some("tok")).await.is_allowed());
    }

    #[test]
    fn test_engine_config_timeout() {
        let engine = engine(RuleChain::default()).with_config(&EngineConfig { timeout_ms: 0 });
        assert_eq!(engine.timeout(), None);

        let engine = engine_with_timeout(250);
        assert_eq!(engine.timeout(), Some(Duration::from_millis(250)));
    }

    fn engine_with_timeout(timeout_ms: u64) -> AuthorizationEngine {
        engine(RuleChain::default()).with_config(&EngineConfig { timeout_ms })
    }
}
