//! Configuration loading and persistence.

use super::Config;
use crate::env;
use crate::error::ConfigError;
use crate::paths;
use std::fs;
use std::path::Path;
use tracing::debug;

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

impl Config {
    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = paths::config_file()?;
        Self::load(&path)
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to JSON5 string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 doesn't have a serializer, so we use serde_json with pretty print
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.store.label.trim().is_empty() {
            errors.push("store.label must not be empty".to_string());
        }
        if self.store.service.trim().is_empty() {
            errors.push("store.service must not be empty".to_string());
        }
        let folder = self.store.pass_folder.trim();
        if folder.is_empty() || folder.starts_with('/') || folder.split('/').any(|c| c == "..") {
            errors.push("store.pass_folder must be a relative folder name".to_string());
        }
        if !LOG_LEVELS.contains(&self.logging.level.to_ascii_lowercase().as_str()) {
            errors.push(format!(
                "logging.level '{}' is not one of {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Load from `path` (or the default path), falling back to defaults when
    /// no file exists, then apply environment overrides and validate.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let loaded = match path {
            Some(p) => Self::load(p),
            None => Self::load_default(),
        };
        let mut config = match loaded {
            Ok(config) => config,
            // An explicitly named file must exist.
            Err(ConfigError::NotFound(p)) if path.is_none() => {
                debug!(path = %p.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `KEYBRIDGE_BACKEND` and `KEYBRIDGE_LOG` overrides.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(backend) = env::get_var(env::vars::KEYBRIDGE_BACKEND) {
            self.store.backend = backend.parse()?;
        }
        if let Some(level) = env::get_var(env::vars::KEYBRIDGE_LOG) {
            self.logging.level = level;
        }
        Ok(())
    }
}
