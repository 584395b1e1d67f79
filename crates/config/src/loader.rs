//! Configuration loader for runguard
//!
//! Resolves the configuration file (explicit path, else `RUNGUARD_CONFIG`),
//! layers environment overrides on top, and validates the result.

use crate::config::ControlConfig;
use runguard_core::{constants::RUNGUARD_CONFIG_VAR, Result};
use std::path::PathBuf;

/// Startup configuration loader
pub struct ConfigLoader {
    /// Explicit configuration file
    file: Option<PathBuf>,
    /// Whether to apply `RUNGUARD_*` overrides
    use_env: bool,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            file: None,
            use_env: true,
        }
    }

    /// Set the configuration file to load
    pub fn file(mut self, path: PathBuf) -> Self {
        self.file = Some(path);
        self
    }

    /// Set whether environment overrides are applied
    pub fn use_env(mut self, use_env: bool) -> Self {
        self.use_env = use_env;
        self
    }

    /// Load the configuration
    pub fn load(self) -> Result<ControlConfig> {
        let file = self.file.or_else(|| {
            if self.use_env {
                std::env::var_os(RUNGUARD_CONFIG_VAR).map(PathBuf::from)
            } else {
                None
            }
        });

        let mut config = match file {
            Some(path) => ControlConfig::from_file(&path)?,
            None => {
                tracing::debug!("no configuration file, using defaults");
                ControlConfig::default()
            }
        };

        if self.use_env {
            config.apply_env()?;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
