//! Trellis Configuration System
//!
//! Provides the declaration model for multi-project build layouts:
//! - Project declarations (trellis.toml)
//! - Global user configuration (~/.trellis/config.toml)
//! - Configuration precedence and merging
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.trellis/config.toml)
//! 2. Project config (./trellis.toml)
//! 3. Environment variables (TRELLIS_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use trellis_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Name of the project declaration file
pub const PROJECT_FILE_NAME: &str = "trellis.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::{
    EvaluationDeclaration, ProjectConfig, RepositorySpec, WELL_KNOWN_REPOSITORIES,
};
