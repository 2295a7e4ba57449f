//! Bridge contract tests.
//!
//! Exercise the add/get/delete laws through the `KeychainBridge` trait
//! object, the way the helper binary uses a store.

use keybridge_core::config::{Backend, StoreConfig};
use keybridge_core::{BridgeError, Credential, KeychainBridge, Protocol, ServerIdentity};
use keybridge_integration_tests::example_identity;
use keybridge_store::open_bridge;

fn memory_bridge() -> Box<dyn KeychainBridge> {
    open_bridge(&StoreConfig {
        backend: Backend::Memory,
        ..StoreConfig::default()
    })
    .unwrap()
}

#[test]
fn test_add_get_delete_walkthrough() {
    let bridge = memory_bridge();
    let id = example_identity();

    bridge.add(&id, &Credential::new("alice", "s3cr3t")).unwrap();

    let cred = bridge.get(&id).unwrap();
    assert_eq!(cred.username(), b"alice");
    assert_eq!(cred.password().expose_secret(), b"s3cr3t");

    bridge.delete(&id).unwrap();
    assert!(matches!(bridge.get(&id), Err(BridgeError::NotFound)));
}

#[test]
fn test_get_never_returns_empty_credential_for_missing_key() {
    let bridge = memory_bridge();
    let result = bridge.get(&ServerIdentity::new(Protocol::Https, "missing.example"));
    assert!(result.unwrap_err().is_not_found());
}

#[test]
fn test_second_add_overwrites() {
    let bridge = memory_bridge();
    let id = ServerIdentity::new(Protocol::Https, "registry.example").with_port(5000);

    bridge.add(&id, &Credential::new("alice", "first")).unwrap();
    bridge.add(&id, &Credential::new("alice", "second")).unwrap();

    assert_eq!(bridge.get(&id).unwrap().password().expose_secret(), b"second");
    assert_eq!(bridge.list().unwrap().len(), 1);
}

#[test]
fn test_non_text_password_bytes_survive() {
    let bridge = memory_bridge();
    let id = example_identity();
    let raw: Vec<u8> = (0u8..=255).collect();

    bridge.add(&id, &Credential::new("bytes", raw.clone())).unwrap();
    assert_eq!(bridge.get(&id).unwrap().password().expose_secret(), raw.as_slice());
}

#[test]
fn test_validation_errors() {
    let bridge = memory_bridge();
    assert!(matches!(
        bridge.add(&example_identity(), &Credential::new("alice", "")),
        Err(BridgeError::MissingSecret)
    ));
    assert!(matches!(
        bridge.get(&ServerIdentity::new(Protocol::Https, " ")),
        Err(BridgeError::MissingServerUrl)
    ));
}

#[test]
fn test_bridge_is_shareable_across_threads() {
    let bridge: std::sync::Arc<dyn KeychainBridge> = std::sync::Arc::from(memory_bridge());

    let handles: Vec<_> = (0..8u16)
        .map(|i| {
            let bridge = bridge.clone();
            std::thread::spawn(move || {
                let id = ServerIdentity::new(Protocol::Https, "threads.example").with_port(1000 + i);
                bridge
                    .add(&id, &Credential::new(format!("user{i}"), "pw"))
                    .unwrap();
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(bridge.list().unwrap().len(), 8);
}
