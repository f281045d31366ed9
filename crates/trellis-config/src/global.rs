//! Global Configuration (~/.trellis/config.toml)
//!
//! Handles user-level defaults stored in `~/.trellis/config.toml`.

use crate::project::RepositorySpec;
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.trellis/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Default settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsConfig>,
}

/// Default settings applied when a project leaves them undeclared
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct DefaultsConfig {
    /// Default root output directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,

    /// Repositories used for any scope the project does not declare
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub repositories: Vec<RepositorySpec>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the global configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(defaults) = &self.defaults {
            if let Some(dir) = &defaults.build_dir {
                if dir.as_os_str().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "defaults.build-dir".to_string(),
                        reason: "path cannot be empty".to_string(),
                    });
                }
            }
            for repo in &defaults.repositories {
                repo.validate("defaults.repositories")?;
            }
        }
        Ok(())
    }

    /// Get the global config file path (~/.trellis/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".trellis").join("config.toml"))
    }

    /// Default root output directory
    pub fn default_build_dir(&self) -> Option<&Path> {
        self.defaults.as_ref().and_then(|d| d.build_dir.as_deref())
    }

    /// Default repositories
    pub fn default_repositories(&self) -> &[RepositorySpec] {
        self.defaults
            .as_ref()
            .map(|d| d.repositories.as_slice())
            .unwrap_or(&[])
    }
}
