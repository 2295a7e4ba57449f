//! Server identity: the lookup key into the secure store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{BridgeError, Result};

/// Transport scheme a credential is bound to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// No protocol attribute; matches any scheme on lookup where the store allows it.
    Generic,
    Http,
    #[default]
    Https,
}

impl Protocol {
    /// URL scheme for this protocol, if it has one.
    pub fn scheme(&self) -> Option<&'static str> {
        match self {
            Self::Generic => None,
            Self::Http => Some("http"),
            Self::Https => Some("https"),
        }
    }

    /// Parse a URL scheme. Only `http` and `https` are accepted.
    pub fn from_scheme(scheme: &str) -> Result<Self> {
        match scheme.to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(BridgeError::UnsupportedScheme(other.to_string())),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme().unwrap_or("generic"))
    }
}

/// The addressable endpoint a credential is associated with.
///
/// `(protocol, host, path, port)` is the key. An empty `path` means "not
/// scoped" and a `port` of 0 means "default port".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerIdentity {
    pub protocol: Protocol,
    pub host: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub port: u16,
}

impl ServerIdentity {
    /// Create an identity with no path and the default port.
    pub fn new(protocol: Protocol, host: impl Into<String>) -> Self {
        Self {
            protocol,
            host: host.into(),
            path: String::new(),
            port: 0,
        }
    }

    /// Set the path component.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Set the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Reject identities the store cannot key on.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(BridgeError::MissingServerUrl);
        }
        Ok(())
    }

    /// Whether a stored identity is selected by this one used as a query.
    ///
    /// A port of 0 and the `Generic` protocol act as wildcards, the same way
    /// an omitted attribute does in a keychain query. Host and path always
    /// match exactly.
    pub fn matches(&self, stored: &ServerIdentity) -> bool {
        self.host == stored.host
            && self.path == stored.path
            && (self.port == 0 || self.port == stored.port)
            && (self.protocol == Protocol::Generic || self.protocol == stored.protocol)
    }

    /// Render as a server URL, e.g. `https://registry.example.com:5000/v2`.
    ///
    /// `Generic` identities render without a scheme.
    pub fn to_server_url(&self) -> String {
        let mut out = String::new();
        if let Some(scheme) = self.protocol.scheme() {
            out.push_str(scheme);
            out.push_str("://");
        }
        out.push_str(&self.host);
        if self.port != 0 {
            out.push(':');
            out.push_str(&self.port.to_string());
        }
        if !self.path.is_empty() {
            if !self.path.starts_with('/') {
                out.push('/');
            }
            out.push_str(&self.path);
        }
        out
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_server_url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_from_scheme() {
        assert_eq!(Protocol::from_scheme("http").unwrap(), Protocol::Http);
        assert_eq!(Protocol::from_scheme("HTTPS").unwrap(), Protocol::Https);
        let err = Protocol::from_scheme("ftp").unwrap_err();
        assert_eq!(err.to_string(), "unsupported scheme: ftp");
    }

    #[test]
    fn test_validate_empty_host() {
        let id = ServerIdentity::new(Protocol::Https, "");
        assert!(matches!(id.validate(), Err(BridgeError::MissingServerUrl)));
        assert!(ServerIdentity::new(Protocol::Https, "example.com")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_matches_wildcards() {
        let stored = ServerIdentity::new(Protocol::Https, "example.com")
            .with_path("/v2")
            .with_port(5000);

        let any_port = ServerIdentity::new(Protocol::Https, "example.com").with_path("/v2");
        assert!(any_port.matches(&stored));

        let any_proto = ServerIdentity::new(Protocol::Generic, "example.com")
            .with_path("/v2")
            .with_port(5000);
        assert!(any_proto.matches(&stored));

        let wrong_path = ServerIdentity::new(Protocol::Https, "example.com").with_port(5000);
        assert!(!wrong_path.matches(&stored));

        let wrong_port = any_port.clone().with_port(443);
        assert!(!wrong_port.matches(&stored));

        let wrong_proto = ServerIdentity::new(Protocol::Http, "example.com").with_path("/v2");
        assert!(!wrong_proto.matches(&stored));
    }

    #[test]
    fn test_to_server_url() {
        let id = ServerIdentity::new(Protocol::Https, "foobar.docker.io")
            .with_port(2376)
            .with_path("/v1");
        assert_eq!(id.to_server_url(), "https://foobar.docker.io:2376/v1");

        let generic = ServerIdentity::new(Protocol::Generic, "example.com");
        assert_eq!(generic.to_string(), "example.com");
    }
}
