//! Access control module
//!
//! Route-based authorization: an ordered chain of rules, each selecting
//! requests by Ant-style path patterns and running a check against them.
//!
//! ## Evaluation Model
//!
//! For every request the engine builds a fresh [`AuthorizationContext`] and
//! walks the [`RuleChain`] in registration order:
//!
//! 1. A rule whose include/exclude patterns (and method filter) do not select
//!    the request is skipped.
//! 2. A selected rule runs its check. The first denial ends evaluation and is
//!    returned as is.
//! 3. A selected `stop` rule that allows ends evaluation with Allow.
//! 4. If no rule denies, the request is allowed.
//!
//! Order is part of the contract: a broad login rule registered first
//! protects every narrower role or permission rule registered after it.
//! Provider failures and timeouts deny with `PROVIDER_ERROR`; nothing fails
//! open.
//!
//! ## Example Configuration
//!
//! ```toml
//! [[rules]]
//! name = "login"
//! include = ["/**"]
//! exclude = ["/auth/doLogin", "/auth/register"]
//! check = "login"
//!
//! [[rules]]
//! include = ["/admin/**"]
//! check = "role_or"
//! params = ["admin", "super-admin"]
//!
//! [[rules]]
//! include = ["/goods/**"]
//! check = "permission"
//! params = ["goods"]
//! ```

pub mod chain;
pub mod checks;
pub mod context;
pub mod engine;
pub mod patterns;
pub mod rule;
pub mod stats;
pub mod types;

pub use chain::RuleChain;
pub use checks::{
    AllOf, Check, CheckRegistry, CheckResult, FnCheck, LoginCheck, MatchMode, PermissionCheck,
    RoleCheck, SharedCheck, check_fn,
};
pub use context::{AuthorizationContext, permission_grants};
pub use engine::AuthorizationEngine;
pub use patterns::{PathPattern, PatternMatcher};
pub use rule::{Rule, RuleBuilder};
pub use stats::{DecisionStats, StatsSnapshot};
pub use types::{AuthRequest, CheckType, Decision, PrincipalId, ReasonCode};
