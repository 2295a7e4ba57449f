//! Shared fixtures for keybridge integration tests.

use keybridge_core::{Protocol, ServerIdentity};

/// The identity used by the add/get/delete walkthrough.
pub fn example_identity() -> ServerIdentity {
    ServerIdentity::new(Protocol::Generic, "example.com")
}
