//! Build layout error types
use std::path::PathBuf;
use thiserror::Error;
use trellis_config::ConfigError;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(
        "Circular evaluation dependency: '{dependent}' cannot depend on '{dependency}' ({cycle})"
    )]
    CyclicDependency {
        dependent: String,
        dependency: String,
        cycle: String,
    },

    #[error("Failed to delete {path}: {source}")]
    Filesystem {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Task not found: {task}")]
    TaskNotFound { task: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BuildError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a filesystem error with path context
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Create a task not found error
    pub fn task_not_found(task: impl Into<String>) -> Self {
        Self::TaskNotFound { task: task.into() }
    }
}
