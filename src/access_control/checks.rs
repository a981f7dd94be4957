//! Rule checks
//!
//! A check inspects the [`AuthorizationContext`] and returns a [`Decision`].
//! Checks are read-only: apart from provider lookups (memoized on the
//! context) and logging they have no side effects. A provider failure is
//! returned as `Err` and turned into a `PROVIDER_ERROR` denial by the chain.

use crate::access_control::context::AuthorizationContext;
use crate::access_control::types::Decision;
use crate::error::{Denial, ProviderError};
use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Result of running a check
pub type CheckResult = Result<Decision, ProviderError>;

/// A decision function attached to a rule
#[async_trait]
pub trait Check: Send + Sync {
    async fn check(&self, ctx: &AuthorizationContext) -> CheckResult;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Shared check handle
pub type SharedCheck = Arc<dyn Check>;

/// Whether a set requirement is satisfied by any or all of its entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Any,
    All,
}

/// Requires a logged-in principal
#[derive(Debug, Clone, Copy, Default)]
pub struct LoginCheck;

#[async_trait]
impl Check for LoginCheck {
    async fn check(&self, ctx: &AuthorizationContext) -> CheckResult {
        if ctx.is_logged_in().await? {
            Ok(Decision::Allow)
        } else {
            Ok(Decision::Deny(Denial::not_login()))
        }
    }

    fn describe(&self) -> String {
        "login".to_string()
    }
}

/// Requires the principal to hold any or all of a set of roles
///
/// Not being logged in is reported as `NOT_LOGIN`, not `ROLE_DENIED`.
#[derive(Debug, Clone)]
pub struct RoleCheck {
    roles: Vec<String>,
    mode: MatchMode,
}

impl RoleCheck {
    pub fn any<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            mode: MatchMode::Any,
        }
    }

    pub fn all<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
            mode: MatchMode::All,
        }
    }
}

#[async_trait]
impl Check for RoleCheck {
    async fn check(&self, ctx: &AuthorizationContext) -> CheckResult {
        if !ctx.is_logged_in().await? {
            return Ok(Decision::Deny(Denial::not_login()));
        }

        let held = ctx.roles().await?;
        let decision = match self.mode {
            MatchMode::Any if self.roles.iter().any(|r| held.contains(r)) => Decision::Allow,
            MatchMode::Any => Decision::Deny(Denial::role_denied(&self.roles)),
            MatchMode::All => {
                let missing: Vec<String> = self
                    .roles
                    .iter()
                    .filter(|r| !held.contains(*r))
                    .cloned()
                    .collect();
                if missing.is_empty() {
                    Decision::Allow
                } else {
                    Decision::Deny(Denial::role_denied(&missing))
                }
            }
        };
        Ok(decision)
    }

    fn describe(&self) -> String {
        match self.mode {
            MatchMode::Any => format!("role_or[{}]", self.roles.join(",")),
            MatchMode::All => format!("role_and[{}]", self.roles.join(",")),
        }
    }
}

/// Requires the principal to hold any or all of a set of permission codes
#[derive(Debug, Clone)]
pub struct PermissionCheck {
    permissions: Vec<String>,
    mode: MatchMode,
}

impl PermissionCheck {
    pub fn all<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            mode: MatchMode::All,
        }
    }

    pub fn any<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            permissions: permissions.into_iter().map(Into::into).collect(),
            mode: MatchMode::Any,
        }
    }
}

#[async_trait]
impl Check for PermissionCheck {
    async fn check(&self, ctx: &AuthorizationContext) -> CheckResult {
        if !ctx.is_logged_in().await? {
            return Ok(Decision::Deny(Denial::not_login()));
        }

        match self.mode {
            MatchMode::All => {
                for code in &self.permissions {
                    if !ctx.has_permission(code).await? {
                        return Ok(Decision::Deny(Denial::permission_denied(code)));
                    }
                }
                Ok(Decision::Allow)
            }
            MatchMode::Any => {
                for code in &self.permissions {
                    if ctx.has_permission(code).await? {
                        return Ok(Decision::Allow);
                    }
                }
                Ok(Decision::Deny(Denial::permission_denied(
                    self.permissions.join(" | "),
                )))
            }
        }
    }

    fn describe(&self) -> String {
        match self.mode {
            MatchMode::All => format!("permission[{}]", self.permissions.join(",")),
            MatchMode::Any => format!("permission_or[{}]", self.permissions.join(",")),
        }
    }
}

/// Runs nested checks in order and returns the first denial
#[derive(Clone, Default)]
pub struct AllOf {
    checks: Vec<SharedCheck>,
}

impl AllOf {
    pub fn new(checks: Vec<SharedCheck>) -> Self {
        Self { checks }
    }

    pub fn and(mut self, check: impl Check + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }
}

#[async_trait]
impl Check for AllOf {
    async fn check(&self, ctx: &AuthorizationContext) -> CheckResult {
        for check in &self.checks {
            let decision = check.check(ctx).await?;
            if decision.is_denied() {
                return Ok(decision);
            }
        }
        Ok(Decision::Allow)
    }

    fn describe(&self) -> String {
        let parts: Vec<String> = self.checks.iter().map(|c| c.describe()).collect();
        format!("all_of({})", parts.join(" & "))
    }
}

/// A check backed by an async closure
///
/// ```
/// use pathguard::access_control::{Decision, check_fn};
/// use pathguard::error::Denial;
///
/// let check = check_fn("not-on-sundays", |ctx| {
///     Box::pin(async move {
///         if ctx.path().ends_with("/sunday") {
///             return Ok(Decision::Deny(Denial::custom(403, "closed")));
///         }
///         Ok(Decision::Allow)
///     })
/// });
/// ```
pub struct FnCheck<F> {
    name: String,
    f: F,
}

/// Wrap an async closure as a [`Check`]
pub fn check_fn<F>(name: impl Into<String>, f: F) -> FnCheck<F>
where
    F: for<'c> Fn(&'c AuthorizationContext) -> BoxFuture<'c, CheckResult> + Send + Sync,
{
    FnCheck {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F> Check for FnCheck<F>
where
    F: for<'c> Fn(&'c AuthorizationContext) -> BoxFuture<'c, CheckResult> + Send + Sync,
{
    async fn check(&self, ctx: &AuthorizationContext) -> CheckResult {
        (self.f)(ctx).await
    }

    fn describe(&self) -> String {
        format!("custom:{}", self.name)
    }
}

impl<F> fmt::Debug for FnCheck<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnCheck").field("name", &self.name).finish()
    }
}

/// Named custom checks that declarative rules can refer to
#[derive(Clone, Default)]
pub struct CheckRegistry {
    checks: HashMap<String, SharedCheck>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a check under `name`, replacing any previous one
    pub fn register(&mut self, name: impl Into<String>, check: impl Check + 'static) {
        self.checks.insert(name.into(), Arc::new(check));
    }

    pub fn with(mut self, name: impl Into<String>, check: impl Check + 'static) -> Self {
        self.register(name, check);
        self
    }

    pub fn get(&self, name: &str) -> Option<SharedCheck> {
        self.checks.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.checks.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl fmt::Debug for CheckRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.checks.keys()).finish()
    }
}
