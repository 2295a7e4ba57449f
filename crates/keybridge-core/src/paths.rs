//! Path resolution utilities.

use crate::env;
use crate::error::ConfigError;
use std::path::PathBuf;

/// Get the keybridge base directory (~/.keybridge).
pub fn base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".keybridge"))
}

/// Get the main config file path (~/.keybridge/keybridge.json5).
pub fn config_file() -> Result<PathBuf, ConfigError> {
    Ok(base_dir()?.join("keybridge.json5"))
}

/// Root of the `pass` password store: `$PASSWORD_STORE_DIR`, else
/// `~/.password-store`.
pub fn password_store_dir() -> Result<PathBuf, ConfigError> {
    if let Some(dir) = env::get_var(env::vars::PASSWORD_STORE_DIR) {
        return Ok(expand_tilde(&dir));
    }
    let home = dirs::home_dir().ok_or_else(|| {
        ConfigError::Validation("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".password-store"))
}

/// Expand tilde (~) in a path.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_dir() {
        let dir = base_dir().unwrap();
        assert!(dir.ends_with(".keybridge"));
    }

    #[test]
    fn test_config_file() {
        let file = config_file().unwrap();
        assert!(file.ends_with(".keybridge/keybridge.json5"));
    }

    #[test]
    fn test_password_store_dir_default() {
        if env::get_var(env::vars::PASSWORD_STORE_DIR).is_none() {
            assert!(password_store_dir().unwrap().ends_with(".password-store"));
        }
    }

    #[test]
    fn test_expand_tilde() {
        let expanded = expand_tilde("~/test");
        assert!(!expanded.to_string_lossy().contains('~'));
        assert_eq!(expand_tilde("/abs/path"), PathBuf::from("/abs/path"));
    }
}
