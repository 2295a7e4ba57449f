//! Helper protocol integration tests.
//!
//! Drive the stdin/stdout framing against the memory store and check the
//! exact bytes a calling tool would see.

use keybridge_cli::protocol;
use keybridge_core::BridgeError;
use keybridge_store::MemoryStore;

#[test]
fn test_store_get_erase_cycle() {
    let bridge = MemoryStore::new();

    protocol::store(
        &bridge,
        r#"{"ServerURL":"https://registry.example:5000/v2","Username":"alice","Secret":"s3cr3t"}"#
            .as_bytes(),
    )
    .unwrap();

    let mut out = Vec::new();
    protocol::get(&bridge, "https://registry.example:5000/v2".as_bytes(), &mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["Username"], "alice");
    assert_eq!(json["Secret"], "s3cr3t");
    assert_eq!(json["ServerURL"], "https://registry.example:5000/v2");

    protocol::erase(&bridge, "https://registry.example:5000/v2".as_bytes()).unwrap();

    let err = protocol::get(&bridge, "https://registry.example:5000/v2".as_bytes(), Vec::new())
        .unwrap_err();
    let message = err.to_string();
    assert!(matches!(
        BridgeError::from_message(&message),
        Some(BridgeError::NotFound)
    ));
}

#[test]
fn test_get_without_port_finds_ported_entry() {
    let bridge = MemoryStore::new();
    protocol::store(
        &bridge,
        r#"{"ServerURL":"registry.example:5000","Username":"bob","Secret":"pw"}"#.as_bytes(),
    )
    .unwrap();

    let mut out = Vec::new();
    protocol::get(&bridge, "registry.example".as_bytes(), &mut out).unwrap();
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["Username"], "bob");
}

#[test]
fn test_list_is_empty_object_for_empty_store() {
    let bridge = MemoryStore::new();
    let mut out = Vec::new();
    protocol::list(&bridge, &mut out).unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "{}\n");
}
