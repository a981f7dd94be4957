//! Ordered rule chain
//!
//! Evaluation walks the rules in registration order. Rules that do not
//! select the request are skipped; the first selected rule that denies ends
//! evaluation with its denial. A selected `stop` rule that allows ends
//! evaluation with Allow. Running off the end of the chain allows.

use crate::access_control::checks::{
    CheckRegistry, LoginCheck, PermissionCheck, RoleCheck, SharedCheck,
};
use crate::access_control::context::AuthorizationContext;
use crate::access_control::rule::Rule;
use crate::access_control::types::{CheckType, Decision};
use crate::config::RuleConfig;
use crate::error::{ConfigError, Denial};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// Immutable, ordered sequence of rules
#[derive(Debug, Default)]
pub struct RuleChain {
    rules: Vec<Rule>,
}

impl RuleChain {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Build a chain from declarative rule configuration
    ///
    /// `custom` rules look their check up in `registry` by the name given as
    /// their single parameter.
    pub fn from_config(rules: &[RuleConfig], registry: &CheckRegistry) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, config)| Self::compile_rule(index, config, registry))
            .collect::<Result<Vec<_>, _>>()?;

        debug!(rules = rules.len(), "Compiled rule chain");
        Ok(Self { rules })
    }

    fn compile_rule(
        index: usize,
        config: &RuleConfig,
        registry: &CheckRegistry,
    ) -> Result<Rule, ConfigError> {
        let check = Self::compile_check(index, config, registry)?;

        let mut builder = Rule::builder_shared(check)
            .name(
                config
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("rule#{}", index)),
            )
            .include_all(config.include.iter().cloned())
            .exclude_all(config.exclude.iter().cloned());
        for method in &config.methods {
            builder = builder.method(method.as_str());
        }
        if config.stop {
            builder = builder.stop();
        }
        builder.build()
    }

    fn compile_check(
        index: usize,
        config: &RuleConfig,
        registry: &CheckRegistry,
    ) -> Result<SharedCheck, ConfigError> {
        let params = &config.params;
        if config.check.requires_params() && params.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("rules[{}]: check '{}' requires params", index, config.check),
            });
        }

        let check: SharedCheck = match config.check {
            CheckType::Login => Arc::new(LoginCheck),
            CheckType::RoleOr => Arc::new(RoleCheck::any(params.iter().cloned())),
            CheckType::RoleAnd => Arc::new(RoleCheck::all(params.iter().cloned())),
            CheckType::Permission => Arc::new(PermissionCheck::all(params.iter().cloned())),
            CheckType::PermissionOr => Arc::new(PermissionCheck::any(params.iter().cloned())),
            CheckType::Custom => {
                let [name] = params.as_slice() else {
                    return Err(ConfigError::Invalid {
                        message: format!(
                            "rules[{}]: custom check takes exactly one param (the check name)",
                            index
                        ),
                    });
                };
                registry.get(name).ok_or_else(|| ConfigError::Invalid {
                    message: format!("rules[{}]: unknown custom check '{}'", index, name),
                })?
            }
        };
        Ok(check)
    }

    /// Run the chain against one request context
    pub async fn evaluate(&self, ctx: &AuthorizationContext) -> Decision {
        for rule in &self.rules {
            if !rule.selects_request(ctx.method(), ctx.path()) {
                trace!(rule = rule.name(), "Rule not selected");
                continue;
            }

            match rule.check().check(ctx).await {
                Ok(Decision::Allow) if rule.is_stop() => {
                    debug!(rule = rule.name(), path = ctx.path(), "Stop rule allowed request");
                    return Decision::Allow;
                }
                Ok(Decision::Allow) => {
                    trace!(rule = rule.name(), "Rule passed");
                }
                Ok(Decision::Deny(denial)) => {
                    info!(
                        rule = rule.name(),
                        path = ctx.path(),
                        reason = %denial.reason,
                        "Request denied"
                    );
                    return Decision::Deny(denial);
                }
                Err(error) => {
                    warn!(
                        rule = rule.name(),
                        path = ctx.path(),
                        error = %error,
                        "Provider failed during check, denying"
                    );
                    return Decision::Deny(Denial::provider_error(&error));
                }
            }
        }

        debug!(path = ctx.path(), "Request allowed");
        Decision::Allow
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }
}

impl FromIterator<Rule> for RuleChain {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::checks::check_fn;
    use crate::access_control::types::{AuthRequest, ReasonCode};
    use crate::auth::InMemoryIdentityStore;

    fn rule_config(check: CheckType, include: &[&str], params: &[&str]) -> RuleConfig {
        RuleConfig {
            name: None,
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: Vec::new(),
            methods: Vec::new(),
            check,
            params: params.iter().map(|s| s.to_string()).collect(),
            stop: false,
        }
    }

    fn context(path: &str, token: Option<&str>) -> AuthorizationContext {
        let store = Arc::new(InMemoryIdentityStore::new().with_user(
            "1",
            "tok",
            ["user"],
            ["goods"],
        ));
        AuthorizationContext::new(AuthRequest::new(path).token(token), store.clone(), store)
    }

    #[test]
    fn test_from_config_names_rules() {
        let mut login = rule_config(CheckType::Login, &["/**"], &[]);
        login.name = Some("login".to_string());
        let role = rule_config(CheckType::RoleOr, &["/admin/**"], &["admin"]);

        let chain = RuleChain::from_config(&[login, role], &CheckRegistry::new()).unwrap();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.rules()[0].name(), "login");
        assert_eq!(chain.rules()[1].name(), "rule#1");
    }

    #[test]
    fn test_from_config_rejects_missing_params() {
        let role = rule_config(CheckType::RoleOr, &["/admin/**"], &[]);
        let result = RuleChain::from_config(&[role], &CheckRegistry::new());
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_from_config_custom_lookup() {
        let custom = rule_config(CheckType::Custom, &["/**"], &["business-hours"]);

        let missing = RuleChain::from_config(std::slice::from_ref(&custom), &CheckRegistry::new());
        match missing {
            Err(ConfigError::Invalid { message }) => assert!(message.contains("business-hours")),
            other => panic!("expected Invalid, got {other:?}"),
        }

        let registry = CheckRegistry::new().with("business-hours", LoginCheck);
        assert!(RuleChain::from_config(&[custom], &registry).is_ok());

        let two_params = rule_config(CheckType::Custom, &["/**"], &["a", "b"]);
        assert!(RuleChain::from_config(&[two_params], &registry).is_err());
    }

    #[tokio::test]
    async fn test_first_denial_short_circuits() {
        let chain = RuleChain::new(vec![
            Rule::builder(LoginCheck).include("/**").build().unwrap(),
            Rule::builder(check_fn("later", |_| {
                Box::pin(async { Ok(Decision::Deny(Denial::custom(500, "later rule ran"))) })
            }))
            .include("/admin/**")
            .build()
            .unwrap(),
        ]);

        let decision = chain.evaluate(&context("/admin/x", None)).await;
        assert_eq!(decision.reason(), Some(ReasonCode::NotLogin));
    }

    #[tokio::test]
    async fn test_stop_rule_ends_evaluation() {
        let chain = RuleChain::new(vec![
            Rule::builder(check_fn("open", |_| Box::pin(async { Ok(Decision::Allow) })))
                .include("/public/**")
                .stop()
                .build()
                .unwrap(),
            Rule::builder(LoginCheck).include("/**").build().unwrap(),
        ]);

        assert!(chain.evaluate(&context("/public/a", None)).await.is_allowed());
        assert_eq!(
            chain.evaluate(&context("/private", None)).await.reason(),
            Some(ReasonCode::NotLogin)
        );
    }

    #[tokio::test]
    async fn test_empty_chain_allows() {
        let chain = RuleChain::default();
        assert!(chain.is_empty());
        assert!(chain.evaluate(&context("/anything", None)).await.is_allowed());
    }
}
