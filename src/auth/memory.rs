//! In-memory identity store
//!
//! Serves both provider traits from a static user table loaded from the
//! `[identity]` configuration section. Useful for the bundled gateway, for
//! local development, and as a test double.

use crate::access_control::PrincipalId;
use crate::auth::provider::{PermissionProvider, SessionProvider};
use crate::config::{IdentityConfig, UserConfig};
use crate::error::{ConfigError, ProviderResult};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::trace;

#[derive(Debug, Default)]
struct UserGrants {
    roles: HashSet<String>,
    permissions: HashSet<String>,
}

/// Static identity store
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    tokens: HashMap<String, PrincipalId>,
    grants: HashMap<PrincipalId, UserGrants>,
}

impl InMemoryIdentityStore {
    /// Create an empty store (every token resolves to "not logged in")
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the store from configuration
    pub fn from_config(config: &IdentityConfig) -> Result<Self, ConfigError> {
        let mut store = Self::new();
        for user in &config.users {
            store.insert(user)?;
        }
        Ok(store)
    }

    fn insert(&mut self, user: &UserConfig) -> Result<(), ConfigError> {
        let principal = PrincipalId::new(&user.id);

        for token in &user.tokens {
            let token = token.expose_secret();
            if let Some(owner) = self.tokens.get(token) {
                return Err(ConfigError::Invalid {
                    message: format!(
                        "token assigned to both '{}' and '{}'",
                        owner, principal
                    ),
                });
            }
            self.tokens.insert(token.to_string(), principal.clone());
        }

        let grants = self.grants.entry(principal).or_default();
        grants.roles.extend(user.roles.iter().cloned());
        grants.permissions.extend(user.permissions.iter().cloned());
        Ok(())
    }

    /// Register a user programmatically
    pub fn with_user<R, P>(
        mut self,
        id: &str,
        token: &str,
        roles: R,
        permissions: P,
    ) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        let principal = PrincipalId::new(id);
        self.tokens.insert(token.to_string(), principal.clone());
        let grants = self.grants.entry(principal).or_default();
        grants.roles.extend(roles.into_iter().map(Into::into));
        grants
            .permissions
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    /// Number of distinct principals
    pub fn user_count(&self) -> usize {
        self.grants.len()
    }
}

#[async_trait]
impl SessionProvider for InMemoryIdentityStore {
    async fn resolve_principal(&self, token: &str) -> ProviderResult<Option<PrincipalId>> {
        let principal = self.tokens.get(token).cloned();
        trace!(found = principal.is_some(), "Resolved token against identity store");
        Ok(principal)
    }

    fn provider_type(&self) -> &'static str {
        "in-memory"
    }
}

#[async_trait]
impl PermissionProvider for InMemoryIdentityStore {
    async fn get_roles(&self, principal: &PrincipalId) -> ProviderResult<HashSet<String>> {
        Ok(self
            .grants
            .get(principal)
            .map(|g| g.roles.clone())
            .unwrap_or_default())
    }

    async fn get_permissions(&self, principal: &PrincipalId) -> ProviderResult<HashSet<String>> {
        Ok(self
            .grants
            .get(principal)
            .map(|g| g.permissions.clone())
            .unwrap_or_default())
    }

    fn provider_type(&self) -> &'static str {
        "in-memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::SecretString;

    fn user(id: &str, tokens: &[&str], roles: &[&str]) -> UserConfig {
        UserConfig {
            id: id.to_string(),
            tokens: tokens.iter().map(|t| SecretString::new(*t)).collect(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
            permissions: vec!["goods".to_string()],
        }
    }

    #[test]
    fn test_resolve_known_and_unknown_tokens() {
        let store = InMemoryIdentityStore::from_config(&IdentityConfig {
            users: vec![user("10001", &["tok-a", "tok-b"], &["admin"])],
        })
        .unwrap();

        let principal = tokio_test::block_on(store.resolve_principal("tok-b")).unwrap();
        assert_eq!(principal, Some(PrincipalId::new("10001")));

        let missing = tokio_test::block_on(store.resolve_principal("nope")).unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_grants_lookup() {
        let store = InMemoryIdentityStore::new().with_user(
            "10002",
            "tok",
            ["user"],
            ["goods.*"],
        );
        let principal = PrincipalId::new("10002");

        let roles = store.get_roles(&principal).await.unwrap();
        assert!(roles.contains("user"));

        let permissions = store.get_permissions(&principal).await.unwrap();
        assert!(permissions.contains("goods.*"));

        let stranger = store.get_roles(&PrincipalId::new("nobody")).await.unwrap();
        assert!(stranger.is_empty());
    }

    #[test]
    fn test_duplicate_token_rejected() {
        let result = InMemoryIdentityStore::from_config(&IdentityConfig {
            users: vec![user("a", &["shared"], &[]), user("b", &["shared"], &[])],
        });
        assert!(matches!(result.unwrap_err(), ConfigError::Invalid { .. }));
    }

    #[test]
    fn test_user_entries_merge_by_id() {
        let store = InMemoryIdentityStore::from_config(&IdentityConfig {
            users: vec![user("a", &["t1"], &["user"]), user("a", &["t2"], &["admin"])],
        })
        .unwrap();
        assert_eq!(store.user_count(), 1);
        let roles = tokio_test::block_on(store.get_roles(&PrincipalId::new("a"))).unwrap();
        assert_eq!(roles.len(), 2);
    }
}
