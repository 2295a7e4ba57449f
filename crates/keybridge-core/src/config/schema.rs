//! Configuration schema definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Main keybridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Secure store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which secure store adapter to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// The platform's native keychain on macOS, the `keyring` adapter elsewhere.
    #[default]
    Auto,
    /// macOS Keychain internet passwords.
    #[serde(alias = "osxkeychain")]
    Native,
    /// Cross-platform keyring (Secret Service, Windows Credential Manager, ...).
    Keyring,
    /// The `pass` password manager (GPG-encrypted files).
    Pass,
    /// Process-local map. Nothing outlives the process.
    Memory,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Native => "native",
            Self::Keyring => "keyring",
            Self::Pass => "pass",
            Self::Memory => "memory",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "native" | "osxkeychain" => Ok(Self::Native),
            "keyring" => Ok(Self::Keyring),
            "pass" => Ok(Self::Pass),
            "memory" => Ok(Self::Memory),
            other => Err(ConfigError::Validation(format!(
                "unknown backend '{}', expected auto, native, keyring, pass or memory",
                other
            ))),
        }
    }
}

/// Secure store section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Adapter selection.
    #[serde(default)]
    pub backend: Backend,

    /// Label attached to keychain items written by keybridge. `list` only
    /// reports items carrying this label.
    #[serde(default = "default_label")]
    pub label: String,

    /// Service name used by the keyring adapter.
    #[serde(default = "default_service")]
    pub service: String,

    /// Folder inside the password store used by the pass adapter.
    #[serde(default = "default_pass_folder")]
    pub pass_folder: String,
}

fn default_label() -> String {
    "keybridge credentials".to_string()
}

fn default_service() -> String {
    "keybridge".to_string()
}

fn default_pass_folder() -> String {
    "keybridge".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            label: default_label(),
            service: default_service(),
            pass_folder: default_pass_folder(),
        }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive level for keybridge targets.
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}
