//! Token extraction from request headers
//!
//! The configured header is consulted first (its value must carry the
//! configured scheme prefix, if one is set), then the configured cookie.

use crate::config::TokenConfig;
use crate::error::ConfigError;
use axum::http::{HeaderMap, HeaderName, header};

#[derive(Debug, Clone)]
pub struct TokenExtractor {
    header: HeaderName,
    prefix: Option<String>,
    cookie: Option<String>,
}

impl Default for TokenExtractor {
    fn default() -> Self {
        Self {
            header: header::AUTHORIZATION,
            prefix: Some("Bearer".to_string()),
            cookie: None,
        }
    }
}

impl TokenExtractor {
    pub fn new(config: &TokenConfig) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(config.header.trim().as_bytes()).map_err(|e| {
            ConfigError::Invalid {
                message: format!("token.header '{}': {}", config.header, e),
            }
        })?;

        Ok(Self {
            header,
            prefix: config
                .prefix
                .as_ref()
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty()),
            cookie: config
                .cookie
                .as_ref()
                .map(|c| c.trim().to_string())
                .filter(|c| !c.is_empty()),
        })
    }

    /// Pull the token out of a request's headers
    pub fn extract(&self, headers: &HeaderMap) -> Option<String> {
        let from_header = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| self.strip_prefix(v.trim()))
            .filter(|t| !t.is_empty());
        if let Some(token) = from_header {
            return Some(token.to_string());
        }

        let name = self.cookie.as_deref()?;
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, value)| *key == name && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }

    fn strip_prefix<'v>(&self, value: &'v str) -> Option<&'v str> {
        let Some(prefix) = &self.prefix else {
            return Some(value);
        };
        let (scheme, rest) = value.split_once(' ')?;
        scheme
            .eq_ignore_ascii_case(prefix)
            .then(|| rest.trim())
    }
}
