//! In-process credential store.
//!
//! Stands in for the OS keychain in tests and in `backend = "memory"`
//! sessions. Lookups follow the same laxity as a keychain query: a port of
//! 0 or the `Generic` protocol matches any stored value. `get` returns the
//! first match in key order and `delete` removes every match. `add` only
//! replaces the entry under the exact same key.

use std::collections::BTreeMap;

use parking_lot::Mutex;
use tracing::debug;

use keybridge_core::bridge::validate_add;
use keybridge_core::{BridgeError, Credential, KeychainBridge, Result, ServerIdentity, StoredEntry};

/// A `KeychainBridge` backed by a map guarded by one mutex.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<ServerIdentity, Credential>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl KeychainBridge for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn add(&self, identity: &ServerIdentity, credential: &Credential) -> Result<()> {
        validate_add(identity, credential)?;
        // Keyed on the exact identity, so this replaces in place.
        self.entries
            .lock()
            .insert(identity.clone(), credential.clone());
        debug!(host = %identity.host, port = identity.port, "stored credential in memory");
        Ok(())
    }

    fn get(&self, identity: &ServerIdentity) -> Result<Credential> {
        identity.validate()?;
        let entries = self.entries.lock();
        entries
            .iter()
            .find(|(stored, _)| identity.matches(stored))
            .map(|(_, cred)| cred.clone())
            .ok_or(BridgeError::NotFound)
    }

    fn delete(&self, identity: &ServerIdentity) -> Result<()> {
        identity.validate()?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|stored, _| !identity.matches(stored));
        if entries.len() == before {
            return Err(BridgeError::NotFound);
        }
        debug!(host = %identity.host, port = identity.port, "deleted credential from memory");
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredEntry>> {
        Ok(self
            .entries
            .lock()
            .iter()
            .map(|(identity, cred)| StoredEntry {
                identity: identity.clone(),
                username: cred.username_lossy(),
            })
            .collect())
    }
}
