//! Credential-helper wire protocol.
//!
//! The calling tool runs `keybridge <verb>` and talks over stdin/stdout:
//!
//! - `store`: reads `{"ServerURL", "Username", "Secret"}` JSON
//! - `get`: reads a server URL, writes the same JSON object back
//! - `erase`: reads a server URL
//! - `list`: writes a `{server URL: username}` JSON object
//!
//! These functions are generic over the reader and writer so they can be
//! driven without a process.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

use keybridge_core::{server_url, BridgeError, Credential, KeychainBridge, Result};

/// The JSON object exchanged by `store` and `get`.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CredentialsPayload {
    #[serde(rename = "ServerURL", default)]
    pub server_url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub secret: String,
}

fn read_input<R: Read>(mut reader: R) -> Result<String> {
    let mut input = String::new();
    reader.read_to_string(&mut input)?;
    Ok(input)
}

fn read_server_url<R: Read>(reader: R) -> Result<String> {
    let input = read_input(reader)?;
    let server = input.trim();
    if server.is_empty() {
        return Err(BridgeError::MissingServerUrl);
    }
    Ok(server.to_string())
}

/// Handle `store`.
pub fn store<R: Read>(bridge: &dyn KeychainBridge, reader: R) -> Result<()> {
    let input = read_input(reader)?;
    let payload: CredentialsPayload = serde_json::from_str(&input)?;

    if payload.server_url.trim().is_empty() {
        return Err(BridgeError::MissingServerUrl);
    }
    if payload.username.is_empty() {
        return Err(BridgeError::MissingUsername);
    }

    let identity = server_url::parse(&payload.server_url)?;
    debug!(backend = bridge.name(), server = %identity, "store");
    bridge.add(&identity, &Credential::new(payload.username, payload.secret))
}

/// Handle `get`.
pub fn get<R: Read, W: Write>(bridge: &dyn KeychainBridge, reader: R, mut writer: W) -> Result<()> {
    let server = read_server_url(reader)?;
    let identity = server_url::parse(&server)?;
    debug!(backend = bridge.name(), server = %identity, "get");

    let credential = bridge.get(&identity)?;
    let secret = credential
        .password()
        .expose_str()
        .ok_or_else(|| BridgeError::Store("stored secret is not valid UTF-8".to_string()))?
        .to_string();

    let response = CredentialsPayload {
        server_url: server,
        username: credential.username_lossy(),
        secret,
    };
    serde_json::to_writer(&mut writer, &response)?;
    writeln!(writer)?;
    Ok(())
}

/// Handle `erase`.
pub fn erase<R: Read>(bridge: &dyn KeychainBridge, reader: R) -> Result<()> {
    let server = read_server_url(reader)?;
    let identity = server_url::parse(&server)?;
    debug!(backend = bridge.name(), server = %identity, "erase");
    bridge.delete(&identity)
}

/// Handle `list`.
pub fn list<W: Write>(bridge: &dyn KeychainBridge, mut writer: W) -> Result<()> {
    let entries = bridge.list()?;
    debug!(backend = bridge.name(), count = entries.len(), "list");

    let map: BTreeMap<String, String> = entries
        .into_iter()
        .map(|entry| (entry.identity.to_server_url(), entry.username))
        .collect();
    serde_json::to_writer(&mut writer, &map)?;
    writeln!(writer)?;
    Ok(())
}
