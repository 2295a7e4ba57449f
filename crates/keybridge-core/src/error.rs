//! Error types for keybridge.

use std::path::PathBuf;
use thiserror::Error;

/// Message emitted when a lookup finds nothing.
///
/// Callers of the helper binary match on this exact text, so it must not
/// change.
pub const NOT_FOUND_MESSAGE: &str = "credentials not found in native keychain";

/// Message emitted when a request carries no server URL.
pub const MISSING_SERVER_URL_MESSAGE: &str = "no credentials server URL";

/// Message emitted when a store request carries no username.
pub const MISSING_USERNAME_MESSAGE: &str = "no credentials username";

/// Message emitted when a server URL has no host part.
pub const NO_HOSTNAME_MESSAGE: &str = "no hostname in URL";

/// Bridge result type alias.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Errors surfaced by a [`KeychainBridge`](crate::KeychainBridge).
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("{}", MISSING_SERVER_URL_MESSAGE)]
    MissingServerUrl,

    #[error("{}", MISSING_USERNAME_MESSAGE)]
    MissingUsername,

    #[error("no credentials secret")]
    MissingSecret,

    #[error("{}", NO_HOSTNAME_MESSAGE)]
    NoHostname,

    #[error("invalid server URL: {0}")]
    InvalidServerUrl(String),

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("{}", NOT_FOUND_MESSAGE)]
    NotFound,

    #[error("credentials already exist: {0}")]
    Conflict(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error(
        "keychain cannot be accessed because the current session does not allow user interaction. \
         The keychain may be locked; unlock it by running \
         \"security -v unlock-keychain ~/Library/Keychains/login.keychain-db\" and try again"
    )]
    InteractionNotAllowed,

    #[error("secure store unavailable: {0}")]
    Unavailable(String),

    #[error("{0}")]
    Store(String),

    #[error("operation not supported by this backend: {0}")]
    Unsupported(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BridgeError {
    /// Whether this error means the store has no matching entry.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Map a message read back from a helper's stdout to the typed error it
    /// was printed from, if it is one of the well-known messages.
    pub fn from_message(message: &str) -> Option<Self> {
        match message.trim() {
            NOT_FOUND_MESSAGE => Some(Self::NotFound),
            MISSING_SERVER_URL_MESSAGE => Some(Self::MissingServerUrl),
            MISSING_USERNAME_MESSAGE => Some(Self::MissingUsername),
            NO_HOSTNAME_MESSAGE => Some(Self::NoHostname),
            _ => None,
        }
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON5 parse error: {0}")]
    Json5(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message_is_stable() {
        assert_eq!(
            BridgeError::NotFound.to_string(),
            "credentials not found in native keychain"
        );
    }

    #[test]
    fn test_from_message_roundtrip() {
        for err in [
            BridgeError::NotFound,
            BridgeError::MissingServerUrl,
            BridgeError::MissingUsername,
            BridgeError::NoHostname,
        ] {
            let parsed = BridgeError::from_message(&format!("{err}\n")).unwrap();
            assert_eq!(parsed.to_string(), err.to_string());
        }
        assert!(BridgeError::from_message("something else").is_none());
    }

    #[test]
    fn test_interaction_not_allowed_mentions_unlock() {
        let msg = BridgeError::InteractionNotAllowed.to_string();
        assert!(msg.contains("unlock-keychain"));
    }
}
