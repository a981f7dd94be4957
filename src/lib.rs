//! pathguard
//!
//! Route-based authorization for HTTP services: an ordered chain of rules,
//! each selecting request paths with Ant-style patterns and running a check
//! (logged in, has role, has permission, custom) against the caller.
//!
//! ## Features
//!
//! - **Ant-style path patterns** with `*`, `**`, `?` and `{var}` segments
//! - **Short-circuit evaluation**: the first failing check decides the denial
//! - **Fail-closed providers**: errors and timeouts deny with `PROVIDER_ERROR`
//! - **Atomic hot-swap** of the rule chain without blocking evaluations
//! - **Tower layer** for axum applications and a standalone forward-auth gateway
//!
//! ## Evaluation Model
//!
//! ```text
//! for rule in chain:
//!     skip unless path matches include and not exclude
//!     check fails   -> Deny(reason)
//!     check passes  -> next rule (or Allow if the rule is `stop`)
//! Allow
//! ```
//!
//! ## Example Configuration
//!
//! ```toml
//! [[rules]]
//! include = ["/**"]
//! exclude = ["/auth/doLogin"]
//! check = "login"
//!
//! [[rules]]
//! include = ["/admin/**"]
//! check = "role_or"
//! params = ["admin", "super-admin"]
//!
//! [[identity.users]]
//! id = "10001"
//! tokens = ["tok-admin"]
//! roles = ["admin"]
//! ```

pub mod access_control;
pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod transport;
pub mod util;

// Re-export main types
pub use access_control::{AuthRequest, AuthorizationEngine, Decision, PatternMatcher, RuleChain};
pub use config::{AppConfig, load_config};
pub use error::{AppError, Denial, Result};
pub use server::{AuthzLayer, gateway_router};
