//! Per-request authorization context
//!
//! Built fresh for every evaluation and dropped with it. The principal, its
//! roles, and its permissions are resolved on first use and memoized for the
//! rest of that one request only.

use crate::access_control::types::{AuthRequest, PrincipalId};
use crate::auth::{SharedPermissionProvider, SharedSessionProvider};
use crate::error::ProviderResult;
use crate::util::SecretString;
use std::collections::HashSet;
use std::fmt;
use tokio::sync::OnceCell;
use tracing::trace;

pub struct AuthorizationContext {
    path: String,
    method: Option<String>,
    token: Option<SecretString>,
    session: SharedSessionProvider,
    permissions: SharedPermissionProvider,
    principal: OnceCell<Option<PrincipalId>>,
    roles: OnceCell<HashSet<String>>,
    granted: OnceCell<HashSet<String>>,
}

impl AuthorizationContext {
    pub fn new(
        request: AuthRequest<'_>,
        session: SharedSessionProvider,
        permissions: SharedPermissionProvider,
    ) -> Self {
        Self {
            path: request.path.to_string(),
            method: request.method.map(str::to_ascii_uppercase),
            token: request
                .token
                .filter(|t| !t.is_empty())
                .map(SecretString::new),
            session,
            permissions,
            principal: OnceCell::new(),
            roles: OnceCell::new(),
            granted: OnceCell::new(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Upper-cased request method, if the caller supplied one
    pub fn method(&self) -> Option<&str> {
        self.method.as_deref()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_ref().map(SecretString::expose_secret)
    }

    /// Resolve the principal behind the token
    ///
    /// `Ok(None)` means the caller is not logged in. Requests without a token
    /// never reach the session provider.
    pub async fn principal(&self) -> ProviderResult<Option<&PrincipalId>> {
        let principal = self
            .principal
            .get_or_try_init(|| async {
                match &self.token {
                    Some(token) => {
                        trace!(provider = self.session.provider_type(), "Resolving principal");
                        self.session.resolve_principal(token.expose_secret()).await
                    }
                    None => Ok(None),
                }
            })
            .await?;
        Ok(principal.as_ref())
    }

    pub async fn is_logged_in(&self) -> ProviderResult<bool> {
        Ok(self.principal().await?.is_some())
    }

    /// Roles of the principal (empty when not logged in)
    pub async fn roles(&self) -> ProviderResult<&HashSet<String>> {
        self.roles
            .get_or_try_init(|| async {
                match self.principal().await? {
                    Some(principal) => {
                        trace!(%principal, "Loading roles");
                        self.permissions.get_roles(principal).await
                    }
                    None => Ok(HashSet::new()),
                }
            })
            .await
    }

    /// Permission codes of the principal (empty when not logged in)
    pub async fn permissions(&self) -> ProviderResult<&HashSet<String>> {
        self.granted
            .get_or_try_init(|| async {
                match self.principal().await? {
                    Some(principal) => {
                        trace!(%principal, "Loading permissions");
                        self.permissions.get_permissions(principal).await
                    }
                    None => Ok(HashSet::new()),
                }
            })
            .await
    }

    pub async fn has_role(&self, role: &str) -> ProviderResult<bool> {
        Ok(self.roles().await?.contains(role))
    }

    /// Whether any granted permission covers `code`
    pub async fn has_permission(&self, code: &str) -> ProviderResult<bool> {
        Ok(self
            .permissions()
            .await?
            .iter()
            .any(|granted| permission_grants(granted, code)))
    }
}

impl fmt::Debug for AuthorizationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationContext")
            .field("path", &self.path)
            .field("method", &self.method)
            .field("token", &self.token)
            .field("principal", &self.principal.get())
            .finish_non_exhaustive()
    }
}

/// Whether a granted permission code covers a required one
///
/// `goods.*` covers `goods.list`; `*` covers everything.
pub fn permission_grants(granted: &str, required: &str) -> bool {
    if granted == required || granted == "*" {
        return true;
    }
    granted
        .strip_suffix('*')
        .is_some_and(|prefix| required.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{PermissionProvider, SessionProvider};
    use crate::error::ProviderError;
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts every provider call so memoization can be asserted
    #[derive(Default)]
    struct CountingProvider {
        sessions: AtomicUsize,
        roles: AtomicUsize,
        permissions: AtomicUsize,
        fail_roles: bool,
    }

    #[async_trait]
    impl SessionProvider for CountingProvider {
        async fn resolve_principal(&self, token: &str) -> ProviderResult<Option<PrincipalId>> {
            self.sessions.fetch_add(1, Ordering::SeqCst);
            Ok((token == "valid").then(|| PrincipalId::new("10001")))
        }

        fn provider_type(&self) -> &'static str {
            "counting"
        }
    }

    #[async_trait]
    impl PermissionProvider for CountingProvider {
        async fn get_roles(&self, _: &PrincipalId) -> ProviderResult<HashSet<String>> {
            self.roles.fetch_add(1, Ordering::SeqCst);
            if self.fail_roles {
                return Err(ProviderError::Unavailable("role store down".into()));
            }
            Ok(HashSet::from(["admin".to_string()]))
        }

        async fn get_permissions(&self, _: &PrincipalId) -> ProviderResult<HashSet<String>> {
            self.permissions.fetch_add(1, Ordering::SeqCst);
            Ok(HashSet::from(["goods.*".to_string()]))
        }

        fn provider_type(&self) -> &'static str {
            "counting"
        }
    }

    fn context(provider: &Arc<CountingProvider>, token: Option<&str>) -> AuthorizationContext {
        AuthorizationContext::new(
            AuthRequest::new("/admin/x").method("get").token(token),
            provider.clone(),
            provider.clone(),
        )
    }

    #[tokio::test]
    async fn test_lookups_are_memoized_per_context() {
        let provider = Arc::new(CountingProvider::default());
        let ctx = context(&provider, Some("valid"));

        assert!(ctx.is_logged_in().await.unwrap());
        assert!(ctx.has_role("admin").await.unwrap());
        assert!(!ctx.has_role("user").await.unwrap());
        assert!(ctx.has_permission("goods.list").await.unwrap());
        assert!(ctx.has_permission("goods.delete").await.unwrap());

        assert_eq!(provider.sessions.load(Ordering::SeqCst), 1);
        assert_eq!(provider.roles.load(Ordering::SeqCst), 1);
        assert_eq!(provider.permissions.load(Ordering::SeqCst), 1);

        // A new context starts from scratch
        let ctx = context(&provider, Some("valid"));
        ctx.roles().await.unwrap();
        assert_eq!(provider.sessions.load(Ordering::SeqCst), 2);
        assert_eq!(provider.roles.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_token_skips_session_provider() {
        let provider = Arc::new(CountingProvider::default());
        let ctx = context(&provider, None);

        assert_eq!(ctx.principal().await.unwrap(), None);
        assert!(ctx.roles().await.unwrap().is_empty());
        assert_eq!(provider.sessions.load(Ordering::SeqCst), 0);
        assert_eq!(provider.roles.load(Ordering::SeqCst), 0);

        let ctx = context(&provider, Some(""));
        assert!(ctx.token().is_none());
    }

    #[tokio::test]
    async fn test_provider_error_is_surfaced() {
        let provider = Arc::new(CountingProvider {
            fail_roles: true,
            ..Default::default()
        });
        let ctx = context(&provider, Some("valid"));

        assert!(matches!(
            ctx.roles().await,
            Err(ProviderError::Unavailable(_))
        ));
    }

    #[test]
    fn test_method_is_normalized_and_token_redacted() {
        let provider = Arc::new(CountingProvider::default());
        let ctx = context(&provider, Some("valid"));
        assert_eq!(ctx.method(), Some("GET"));

        let debug_output = format!("{:?}", ctx);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("valid"));
    }

    #[test]
    fn test_permission_grants() {
        assert!(permission_grants("goods", "goods"));
        assert!(!permission_grants("goods", "goods.list"));
        assert!(permission_grants("goods.*", "goods.list"));
        assert!(permission_grants("goods*", "goods-add"));
        assert!(!permission_grants("goods.*", "orders.list"));
        assert!(permission_grants("*", "anything"));
    }
}
