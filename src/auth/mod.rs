//! Authentication module
//!
//! Defines the provider SPI the engine consumes (session validity and
//! role/permission lookups) plus an in-memory implementation of both.
//! Credential checks and token issuance stay with the embedding application.

pub mod memory;
pub mod provider;

pub use memory::InMemoryIdentityStore;
pub use provider::{
    PermissionProvider, SessionProvider, SharedPermissionProvider, SharedSessionProvider,
};

use crate::config::IdentityConfig;
use crate::error::ConfigError;
use std::sync::Arc;
use tracing::info;

/// Create the session and permission providers from configuration
///
/// Both handles point at the same in-memory store.
pub fn create_identity_providers(
    config: &IdentityConfig,
) -> Result<(SharedSessionProvider, SharedPermissionProvider), ConfigError> {
    let store = Arc::new(InMemoryIdentityStore::from_config(config)?);
    info!(users = store.user_count(), "Loaded in-memory identity store");
    let session: SharedSessionProvider = store.clone();
    let permissions: SharedPermissionProvider = store;
    Ok((session, permissions))
}
