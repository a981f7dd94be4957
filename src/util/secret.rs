//! Redacted string type for bearer tokens.
//!
//! A token enters pathguard in two places: the `[[identity.users]]` tables of the
//! identity file and the `Authorization` header (or cookie) of each request.
//! From there it is carried by `UserConfig`, `AuthorizationContext` and the in-memory
//! identity store, all of which implement `Debug` and show up in `tracing`
//! fields. Holding the token as a [`SecretString`] keeps those structures
//! safe to log wholesale.

use serde::Deserialize;
use std::fmt;

/// A bearer token that never prints its value.
///
/// # Guarantees
/// - `Debug` and `Display` render `[REDACTED]`, also when nested in a
///   `Vec`, an `Option` or a derived `Debug` struct
/// - the value is reachable only through [`expose_secret`](Self::expose_secret),
///   so every read is greppable
/// - the buffer is cleared on drop (best-effort, not a zeroizing guarantee)
///
/// # Example
/// ```ignore
/// let token = SecretString::from("tok-10001");
/// tracing::debug!(?token, "Resolving session"); // token=[REDACTED]
///
/// let principal = session.resolve_principal(token.expose_secret()).await?;
/// ```
#[derive(Clone, Default)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a token taken from a header, cookie or identity file.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Borrow the raw token.
    ///
    /// Call this only at the point the token is handed to a session
    /// provider or used as a lookup key; never pass the result to a
    /// formatter or log macro.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Length of the token in bytes, safe to log.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // Clones and the original header bytes are not cleared.
        self.0.clear();
    }
}

/// Identity files list tokens as plain strings.
impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::from)
    }
}
