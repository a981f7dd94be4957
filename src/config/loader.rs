//! Configuration loader with layered sources
//!
//! Loads configuration from multiple sources with the following precedence
//! (highest to lowest):
//! 1. Environment variables (PATHGUARD__*)
//! 2. Configuration file (TOML)
//! 3. Default values

use crate::access_control::PatternMatcher;
use crate::config::types::AppConfig;
use crate::error::ConfigError;
use config::{Config, Environment, File, FileFormat};
use std::collections::HashSet;
use std::path::Path;

/// Default configuration file paths to check (in order)
const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "pathguard.toml",
    ".pathguard.toml",
    "~/.config/pathguard/config.toml",
    "/etc/pathguard/config.toml",
];

/// Load configuration from a TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::from_str(toml_str, FileFormat::Toml))
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Load configuration from files and environment
pub fn load_config(config_path: Option<&str>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. Start with defaults (handled by serde defaults on AppConfig)

    // 2. Add configuration file
    if let Some(path) = config_path {
        // Explicit path provided - must exist
        if !Path::new(path).exists() {
            return Err(ConfigError::Load(format!(
                "Configuration file not found: {}",
                path
            )));
        }
        builder = builder.add_source(File::new(path, FileFormat::Toml));
    } else {
        // Try default paths (first existing one wins)
        for path in DEFAULT_CONFIG_PATHS {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                builder = builder.add_source(File::new(&expanded, FileFormat::Toml));
                break;
            }
        }
    }

    // 3. Add environment variables with PATHGUARD__ prefix
    // e.g., PATHGUARD__SERVER__PORT, PATHGUARD__ENGINE__TIMEOUT_MS
    // Double underscore (__) maps to nested keys (server.port)
    builder = builder.add_source(
        Environment::with_prefix("PATHGUARD")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder
        .build()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::Load(e.to_string()))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// Validate configuration values
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::Invalid {
            message: "server.port must be greater than 0".to_string(),
        });
    }

    if config.token.header.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "token.header".to_string(),
        });
    }

    validate_rules(config)?;
    validate_identity(config)?;

    Ok(())
}

/// Validate rule patterns, parameters, and method names
fn validate_rules(config: &AppConfig) -> Result<(), ConfigError> {
    for (index, rule) in config.rules.iter().enumerate() {
        validate_patterns(&rule.include, &format!("rules[{}].include", index))?;
        validate_patterns(&rule.exclude, &format!("rules[{}].exclude", index))?;

        if rule.check.requires_params() && rule.params.is_empty() {
            return Err(ConfigError::Invalid {
                message: format!("rules[{}]: check '{}' requires params", index, rule.check),
            });
        }

        if let Some(method) = rule
            .methods
            .iter()
            .find(|m| m.is_empty() || !m.chars().all(|c| c.is_ascii_alphabetic()))
        {
            return Err(ConfigError::Invalid {
                message: format!("rules[{}].methods: invalid method '{}'", index, method),
            });
        }
    }
    Ok(())
}

/// Validate the static identity table
fn validate_identity(config: &AppConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (index, user) in config.identity.users.iter().enumerate() {
        if user.id.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: format!("identity.users[{}].id", index),
            });
        }
        for token in &user.tokens {
            if token.is_empty() {
                return Err(ConfigError::Invalid {
                    message: format!("identity.users[{}]: empty token", index),
                });
            }
            if !seen.insert(token.expose_secret()) {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "identity.users[{}]: token already assigned to another user",
                        index
                    ),
                });
            }
        }
    }
    Ok(())
}

/// Validate that all patterns parse
fn validate_patterns(patterns: &[String], field_path: &str) -> Result<(), ConfigError> {
    PatternMatcher::new(patterns)
        .map(|_| ())
        .map_err(|e| match e {
            ConfigError::InvalidPattern { pattern, reason } => ConfigError::InvalidPattern {
                pattern,
                reason: format!("in {}: {}", field_path, reason),
            },
            other => other,
        })
}
