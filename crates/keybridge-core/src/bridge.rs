//! The keychain bridge interface.

use crate::credential::Credential;
use crate::error::Result;
use crate::identity::ServerIdentity;

/// A stored entry as reported by [`KeychainBridge::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredEntry {
    pub identity: ServerIdentity,
    pub username: String,
}

/// Synchronous access to a secure credential store.
///
/// Every call is self-contained: implementations keep no state between
/// calls besides what lives in the store itself, and perform no retries or
/// caching. Concurrent callers are ordered by the store, not by the bridge.
pub trait KeychainBridge: Send + Sync {
    /// Short backend name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Store `credential` under `identity`, replacing any existing entry
    /// with the same key.
    fn add(&self, identity: &ServerIdentity, credential: &Credential) -> Result<()>;

    /// Fetch the credential stored for `identity`.
    ///
    /// Returns [`BridgeError::NotFound`](crate::BridgeError::NotFound) when
    /// nothing matches.
    fn get(&self, identity: &ServerIdentity) -> Result<Credential>;

    /// Remove the entry stored for `identity`.
    ///
    /// Returns [`BridgeError::NotFound`](crate::BridgeError::NotFound) when
    /// nothing matches.
    fn delete(&self, identity: &ServerIdentity) -> Result<()>;

    /// Enumerate entries written through this bridge.
    fn list(&self) -> Result<Vec<StoredEntry>>;
}

/// Check the inputs shared by every backend's `add`.
pub fn validate_add(identity: &ServerIdentity, credential: &Credential) -> Result<()> {
    identity.validate()?;
    credential.validate()
}
