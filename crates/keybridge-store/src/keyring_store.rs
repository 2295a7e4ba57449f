//! Cross-platform adapter over the `keyring` crate.
//!
//! Each identity maps to one keyring entry: the service is the configured
//! service name and the user is the identity's canonical server URL. The
//! stored secret is a small JSON envelope carrying the username and the
//! password, both base64-encoded so arbitrary bytes survive.
//!
//! Keyring entries are addressed exactly, so no wildcard matching applies,
//! and the underlying stores offer no portable enumeration. On Linux the
//! entries live in the Secret Service, cached in the kernel keyring.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::debug;

use keybridge_core::bridge::validate_add;
use keybridge_core::{BridgeError, Credential, KeychainBridge, Result, ServerIdentity, StoredEntry};

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    username: String,
    secret: String,
}

impl Envelope {
    fn seal(credential: &Credential) -> Result<Vec<u8>> {
        let envelope = Self {
            username: STANDARD.encode(credential.username()),
            secret: STANDARD.encode(credential.password().expose_secret()),
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    fn open(data: &[u8]) -> Result<Credential> {
        let envelope: Self = serde_json::from_slice(data)?;
        let username = STANDARD
            .decode(envelope.username)
            .map_err(|e| BridgeError::Store(format!("corrupt keyring entry: {e}")))?;
        let secret = STANDARD
            .decode(envelope.secret)
            .map_err(|e| BridgeError::Store(format!("corrupt keyring entry: {e}")))?;
        Ok(Credential::new(username, secret))
    }
}

/// A `KeychainBridge` over the platform keyring.
pub struct KeyringStore {
    service: String,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, identity: &ServerIdentity) -> Result<keyring::Entry> {
        identity.validate()?;
        keyring::Entry::new(&self.service, &identity.to_server_url()).map_err(map_keyring_error)
    }
}

fn map_keyring_error(err: keyring::Error) -> BridgeError {
    match err {
        keyring::Error::NoEntry => BridgeError::NotFound,
        keyring::Error::NoStorageAccess(e) => BridgeError::AccessDenied(e.to_string()),
        keyring::Error::PlatformFailure(e) => BridgeError::Unavailable(e.to_string()),
        other => BridgeError::Store(other.to_string()),
    }
}

impl KeychainBridge for KeyringStore {
    fn name(&self) -> &'static str {
        "keyring"
    }

    fn add(&self, identity: &ServerIdentity, credential: &Credential) -> Result<()> {
        validate_add(identity, credential)?;
        let entry = self.entry(identity)?;
        // set_secret replaces an existing entry in place.
        entry
            .set_secret(&Envelope::seal(credential)?)
            .map_err(map_keyring_error)?;
        debug!(service = %self.service, server = %identity, "stored credential in keyring");
        Ok(())
    }

    fn get(&self, identity: &ServerIdentity) -> Result<Credential> {
        let data = self
            .entry(identity)?
            .get_secret()
            .map_err(map_keyring_error)?;
        Envelope::open(&data)
    }

    fn delete(&self, identity: &ServerIdentity) -> Result<()> {
        self.entry(identity)?
            .delete_credential()
            .map_err(map_keyring_error)?;
        debug!(service = %self.service, server = %identity, "deleted credential from keyring");
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredEntry>> {
        Err(BridgeError::Unsupported("list"))
    }
}
