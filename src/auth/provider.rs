//! Session and permission provider traits
//!
//! The engine never verifies credentials or stores roles itself. The
//! embedding application hands it one implementation of each trait and the
//! engine calls them lazily, at most once per request.

use crate::access_control::PrincipalId;
use crate::error::ProviderResult;
// async_trait required for dyn-compatibility with Arc<dyn SessionProvider>
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;

/// Resolves a request token into the principal it was issued to
///
/// Implementations must not cache across requests on the engine's behalf;
/// any caching is the provider's own business.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// Resolve a token into a principal id
    ///
    /// Returns `Ok(None)` when the token is unknown, expired, or revoked.
    /// Errors are reserved for the backing store itself failing.
    async fn resolve_principal(&self, token: &str) -> ProviderResult<Option<PrincipalId>>;

    /// Get a description of the provider (for logging)
    fn provider_type(&self) -> &'static str;
}

/// Looks up the roles and permission codes held by a principal
#[async_trait]
pub trait PermissionProvider: Send + Sync {
    /// Roles held by the principal
    async fn get_roles(&self, principal: &PrincipalId) -> ProviderResult<HashSet<String>>;

    /// Permission codes held by the principal
    ///
    /// A code ending in `*` grants every code sharing its prefix, and a bare
    /// `*` grants everything.
    async fn get_permissions(&self, principal: &PrincipalId) -> ProviderResult<HashSet<String>>;

    /// Get a description of the provider (for logging)
    fn provider_type(&self) -> &'static str;
}

/// Shared session provider handle
pub type SharedSessionProvider = Arc<dyn SessionProvider>;

/// Shared permission provider handle
pub type SharedPermissionProvider = Arc<dyn PermissionProvider>;
