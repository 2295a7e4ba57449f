//! # keybridge-core
//!
//! Core types for bridging a credential helper to the OS secure store.
//!
//! - **Identity**: [`ServerIdentity`], the `(protocol, host, path, port)`
//!   key, and [`server_url::parse`] to build one from a registry address
//! - **Credentials**: [`Credential`] pairs with a zeroing [`SecretBytes`]
//!   password
//! - **Bridge**: the [`KeychainBridge`] trait that store adapters implement
//! - **Configuration**: JSON5 config loading, paths and environment overrides

pub mod bridge;
pub mod config;
pub mod credential;
pub mod env;
pub mod error;
pub mod identity;
pub mod paths;
pub mod secret;
pub mod server_url;

pub use bridge::{KeychainBridge, StoredEntry};
pub use config::Config;
pub use credential::Credential;
pub use error::{BridgeError, ConfigError, Result};
pub use identity::{Protocol, ServerIdentity};
pub use secret::SecretBytes;
