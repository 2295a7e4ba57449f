//! Environment variable handling.

use std::env;

/// Environment variable names read by keybridge.
pub mod vars {
    /// Path to the config file.
    pub const KEYBRIDGE_CONFIG: &str = "KEYBRIDGE_CONFIG";
    /// Overrides `store.backend`.
    pub const KEYBRIDGE_BACKEND: &str = "KEYBRIDGE_BACKEND";
    /// Overrides `logging.level`.
    pub const KEYBRIDGE_LOG: &str = "KEYBRIDGE_LOG";
    /// Root of the `pass` password store.
    pub const PASSWORD_STORE_DIR: &str = "PASSWORD_STORE_DIR";
}

/// Get an environment variable, returning None if not set or empty.
pub fn get_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_var_empty_is_none() {
        env::set_var("KEYBRIDGE_TEST_EMPTY", "");
        assert!(get_var("KEYBRIDGE_TEST_EMPTY").is_none());
        env::remove_var("KEYBRIDGE_TEST_EMPTY");
    }

    #[test]
    fn test_get_var_set() {
        env::set_var("KEYBRIDGE_TEST_SET", "memory");
        assert_eq!(get_var("KEYBRIDGE_TEST_SET").as_deref(), Some("memory"));
        env::remove_var("KEYBRIDGE_TEST_SET");
    }
}
