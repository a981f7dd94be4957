//! Configuration types for pathguard
//!
//! This module defines the configuration structure that can be loaded from
//! TOML files and/or environment variables.

use crate::access_control::CheckType;
use crate::util::SecretString;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Gateway listener settings
    pub server: ServerConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Where to find the token on a request
    pub token: TokenConfig,

    /// Engine tuning
    pub engine: EngineConfig,

    /// Ordered authorization rules
    pub rules: Vec<RuleConfig>,

    /// Static identity table for the in-memory providers
    pub identity: IdentityConfig,
}

/// Gateway listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 20290,
        }
    }
}

/// Token extraction configuration
///
/// The header is read first, then the cookie (if configured).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Header carrying the token
    pub header: String,

    /// Required scheme in front of the header value (e.g. `Bearer`)
    pub prefix: Option<String>,

    /// Cookie carrying the token
    pub cookie: Option<String>,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            header: "Authorization".to_string(),
            prefix: Some("Bearer".to_string()),
            cookie: None,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound for one evaluation in milliseconds (0 disables)
    pub timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { timeout_ms: 3000 }
    }
}

impl EngineConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// One declarative rule
///
/// ```toml
/// [[rules]]
/// name = "admin-area"
/// include = ["/admin/**"]
/// exclude = ["/admin/public/**"]
/// methods = ["POST", "DELETE"]
/// check = "role_or"
/// params = ["admin", "super-admin"]
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    /// Name used in logs (defaults to `rule#<index>`)
    #[serde(default)]
    pub name: Option<String>,

    /// Patterns selecting the rule (empty selects everything)
    #[serde(default)]
    pub include: Vec<String>,

    /// Patterns carving paths back out (win over `include`)
    #[serde(default)]
    pub exclude: Vec<String>,

    /// HTTP methods the rule applies to (empty means all)
    #[serde(default)]
    pub methods: Vec<String>,

    /// Check to run
    pub check: CheckType,

    /// Roles, permission codes, or the custom check name
    #[serde(default)]
    pub params: Vec<String>,

    /// End evaluation with Allow when the check passes
    #[serde(default)]
    pub stop: bool,
}

/// Static identity table
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    pub users: Vec<UserConfig>,
}

/// One principal with its tokens and grants
#[derive(Debug, Clone, Deserialize)]
pub struct UserConfig {
    pub id: String,

    #[serde(default)]
    pub tokens: Vec<SecretString>,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Output format (pretty, json)
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output
    #[default]
    Pretty,
    /// JSON structured output
    Json,
}
