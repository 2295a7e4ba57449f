//! Username/password pairs.

use std::fmt;

use crate::error::{BridgeError, Result};
use crate::secret::SecretBytes;

/// A `(username, password)` pair.
///
/// Both halves are explicit-length byte sequences; neither is assumed to be
/// UTF-8 or terminator-free. The password is zeroed on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    username: Vec<u8>,
    password: SecretBytes,
}

impl Credential {
    pub fn new(username: impl Into<Vec<u8>>, password: impl Into<SecretBytes>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &[u8] {
        &self.username
    }

    /// Username decoded as UTF-8, replacing invalid sequences.
    pub fn username_lossy(&self) -> String {
        String::from_utf8_lossy(&self.username).into_owned()
    }

    pub fn password(&self) -> &SecretBytes {
        &self.password
    }

    /// Split into owned parts.
    pub fn into_parts(self) -> (Vec<u8>, SecretBytes) {
        (self.username, self.password)
    }

    /// A credential can only be stored with a non-empty password. The
    /// username may be empty.
    pub fn validate(&self) -> Result<()> {
        if self.password.is_empty() {
            return Err(BridgeError::MissingSecret);
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username_lossy())
            .field("password", &self.password)
            .finish()
    }
}
