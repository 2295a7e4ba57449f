//! Secure store adapters for keybridge.
//!
//! Each adapter implements [`KeychainBridge`]:
//!
//! - [`MacKeychain`]: macOS Keychain internet passwords (macOS only)
//! - [`KeyringStore`]: the platform keyring through the `keyring` crate
//! - [`PassStore`]: the `pass` password manager
//! - [`MemoryStore`]: a process-local map for tests

pub mod keyring_store;
#[cfg(target_os = "macos")]
pub mod macos;
pub mod memory;
pub mod pass;

use keybridge_core::config::{Backend, StoreConfig};
use keybridge_core::{paths, BridgeError, KeychainBridge, Result};
use tracing::debug;

pub use keyring_store::KeyringStore;
#[cfg(target_os = "macos")]
pub use macos::MacKeychain;
pub use memory::MemoryStore;
pub use pass::PassStore;

/// Resolve `Backend::Auto` to the adapter used on this platform.
pub fn resolve_backend(backend: Backend) -> Backend {
    match backend {
        Backend::Auto if cfg!(target_os = "macos") => Backend::Native,
        Backend::Auto => Backend::Keyring,
        other => other,
    }
}

/// Open the adapter selected by `config`.
pub fn open_bridge(config: &StoreConfig) -> Result<Box<dyn KeychainBridge>> {
    let backend = resolve_backend(config.backend);
    debug!(backend = %backend, "opening secure store");

    match backend {
        Backend::Native => open_native(config),
        Backend::Memory => Ok(Box::new(MemoryStore::new())),
        Backend::Pass => {
            let store_dir =
                paths::password_store_dir().map_err(|e| BridgeError::Unavailable(e.to_string()))?;
            Ok(Box::new(PassStore::new(config.pass_folder.clone(), store_dir)))
        }
        Backend::Keyring | Backend::Auto => {
            Ok(Box::new(KeyringStore::new(config.service.clone())))
        }
    }
}

#[cfg(target_os = "macos")]
fn open_native(config: &StoreConfig) -> Result<Box<dyn KeychainBridge>> {
    Ok(Box::new(MacKeychain::new(config.label.clone())))
}

#[cfg(not(target_os = "macos"))]
fn open_native(_config: &StoreConfig) -> Result<Box<dyn KeychainBridge>> {
    Err(BridgeError::Unavailable(
        "the native backend is the macOS Keychain; use the keyring backend on this platform"
            .to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_auto() {
        let resolved = resolve_backend(Backend::Auto);
        if cfg!(target_os = "macos") {
            assert_eq!(resolved, Backend::Native);
        } else {
            assert_eq!(resolved, Backend::Keyring);
        }
        assert_eq!(resolve_backend(Backend::Memory), Backend::Memory);
    }

    #[test]
    fn test_open_memory() {
        let config = StoreConfig {
            backend: Backend::Memory,
            ..StoreConfig::default()
        };
        let bridge = open_bridge(&config).unwrap();
        assert_eq!(bridge.name(), "memory");
    }

    #[test]
    fn test_open_keyring() {
        let config = StoreConfig {
            backend: Backend::Keyring,
            ..StoreConfig::default()
        };
        assert_eq!(open_bridge(&config).unwrap().name(), "keyring");
    }

    #[test]
    fn test_open_pass() {
        let config = StoreConfig {
            backend: Backend::Pass,
            ..StoreConfig::default()
        };
        assert_eq!(open_bridge(&config).unwrap().name(), "pass");
    }

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_native_unavailable_off_macos() {
        let config = StoreConfig {
            backend: Backend::Native,
            ..StoreConfig::default()
        };
        assert!(matches!(
            open_bridge(&config),
            Err(BridgeError::Unavailable(_))
        ));
    }
}
