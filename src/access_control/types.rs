//! Access control types
//!
//! Core types used by the authorization engine.

use crate::error::Denial;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    NotLogin,
    RoleDenied,
    PermissionDenied,
    ProviderError,
    Custom,
}

impl ReasonCode {
    /// Get the wire name of the reason code
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::NotLogin => "NOT_LOGIN",
            ReasonCode::RoleDenied => "ROLE_DENIED",
            ReasonCode::PermissionDenied => "PERMISSION_DENIED",
            ReasonCode::ProviderError => "PROVIDER_ERROR",
            ReasonCode::Custom => "CUSTOM",
        }
    }

    /// Get all reason codes
    pub fn all() -> &'static [ReasonCode] {
        &[
            ReasonCode::NotLogin,
            ReasonCode::RoleDenied,
            ReasonCode::PermissionDenied,
            ReasonCode::ProviderError,
            ReasonCode::Custom,
        ]
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of evaluating a request (or a single check)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// The request may proceed
    Allow,
    /// The request is rejected
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Decision::Deny(_))
    }

    /// Reason code of a denial, `None` when allowed
    pub fn reason(&self) -> Option<ReasonCode> {
        match self {
            Decision::Allow => None,
            Decision::Deny(denial) => Some(denial.reason),
        }
    }

    /// Convert into a `Result`, for callers that prefer `?`
    pub fn into_result(self) -> Result<(), Denial> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(denial) => Err(denial),
        }
    }
}

impl From<Denial> for Decision {
    fn from(denial: Denial) -> Self {
        Decision::Deny(denial)
    }
}

/// Built-in check kinds available to declarative rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    /// A valid session is required
    #[serde(alias = "LOGIN")]
    Login,
    /// The principal must hold at least one of the listed roles
    #[serde(alias = "ROLE_OR", alias = "role")]
    RoleOr,
    /// The principal must hold every listed role
    #[serde(alias = "ROLE_AND")]
    RoleAnd,
    /// The principal must hold every listed permission
    #[serde(alias = "PERMISSION", alias = "permission_and")]
    Permission,
    /// The principal must hold at least one of the listed permissions
    #[serde(alias = "PERMISSION_OR")]
    PermissionOr,
    /// A named check registered by the embedding application
    #[serde(alias = "CUSTOM")]
    Custom,
}

impl CheckType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::Login => "login",
            CheckType::RoleOr => "role_or",
            CheckType::RoleAnd => "role_and",
            CheckType::Permission => "permission",
            CheckType::PermissionOr => "permission_or",
            CheckType::Custom => "custom",
        }
    }

    /// Whether this check needs a non-empty `params` list
    pub fn requires_params(&self) -> bool {
        !matches!(self, CheckType::Login)
    }
}

impl fmt::Display for CheckType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque identifier of an authenticated principal
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// The parts of an inbound request the engine looks at
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthRequest<'a> {
    pub method: Option<&'a str>,
    pub path: &'a str,
    pub token: Option<&'a str>,
}

impl<'a> AuthRequest<'a> {
    pub fn new(path: &'a str) -> Self {
        Self {
            method: None,
            path,
            token: None,
        }
    }

    pub fn method(mut self, method: &'a str) -> Self {
        self.method = Some(method);
        self
    }

    pub fn token(mut self, token: Option<&'a str>) -> Self {
        self.token = token;
        self
    }
}
