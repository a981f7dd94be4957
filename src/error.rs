//! Error types for pathguard
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors that are part of the API.
//! Denials are errors too, but the engine never lets one escape: every
//! failure path is folded into a [`Decision`](crate::access_control::Decision)
//! before it reaches the HTTP layer.

use crate::access_control::ReasonCode;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures raised by a session or permission provider
///
/// The engine treats every one of these as a denial (fail closed).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Backing store unavailable: {0}")]
    Unavailable(String),

    #[error("Provider call timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("Provider failed: {0}")]
    Failed(String),
}

/// Transport layer errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid bind address: {0}")]
    Address(#[from] std::net::AddrParseError),

    #[error("HTTP server error: {0}")]
    Http(String),
}

/// A request path that cannot be evaluated safely
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathError {
    #[error("request path must start with '/'")]
    NotAbsolute,

    #[error("request path climbs above the root")]
    EscapesRoot,

    #[error("request path contains an encoded separator")]
    EncodedSeparator,

    #[error("request path is not valid UTF-8 once decoded")]
    InvalidEncoding,
}

/// A structured authorization denial
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} (HTTP {status}){}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct Denial {
    pub reason: ReasonCode,
    pub status: u16,
    pub message: Option<String>,
}

impl Denial {
    pub fn new(reason: ReasonCode, status: u16) -> Self {
        Self {
            reason,
            status,
            message: None,
        }
    }

    /// No valid session could be resolved for the request
    pub fn not_login() -> Self {
        Self::new(ReasonCode::NotLogin, 401)
    }

    /// The principal holds none (or not all) of the required roles
    pub fn role_denied(required: &[String]) -> Self {
        Self::new(ReasonCode::RoleDenied, 403)
            .with_message(format!("requires role {}", required.join(" | ")))
    }

    /// The principal lacks a required permission code
    pub fn permission_denied(missing: impl Into<String>) -> Self {
        Self::new(ReasonCode::PermissionDenied, 403)
            .with_message(format!("missing permission '{}'", missing.into()))
    }

    /// A provider failed or timed out
    pub fn provider_error(error: &ProviderError) -> Self {
        Self::new(ReasonCode::ProviderError, 503).with_message(error.to_string())
    }

    /// Denial raised by an application-supplied check
    pub fn custom(status: u16, message: impl Into<String>) -> Self {
        Self::new(ReasonCode::Custom, status).with_message(message)
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl From<ProviderError> for Denial {
    fn from(error: ProviderError) -> Self {
        Self::provider_error(&error)
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for provider calls
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
