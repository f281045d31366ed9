//! Configuration Loader
//!
//! Finds trellis.toml and layers it between user defaults and environment overrides.

use crate::global::GlobalConfig;
use crate::project::{ProjectConfig, RepositorySpec};
use crate::{ConfigError, ConfigResult, PROJECT_FILE_NAME};
use std::env;
use std::path::{Path, PathBuf};

/// Default root output directory, relative to the project root
pub const DEFAULT_BUILD_DIR: &str = "build";

/// Environment variable overriding the root output directory
pub const BUILD_DIR_ENV: &str = "TRELLIS_BUILD_DIR";

/// Configuration loader
///
/// Sources, lowest priority first:
/// 1. Global defaults (~/.trellis/config.toml)
/// 2. The nearest trellis.toml
/// 3. Environment variables (TRELLIS_*)
/// 4. CLI flags (applied by the caller)
pub struct ConfigLoader {
    /// Global config location, resolved lazily
    global_config_path: Option<PathBuf>,
}

/// Declarations for one project with every source applied
#[derive(Debug, Clone)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Global configuration
    pub global: GlobalConfig,

    /// Project root directory (where trellis.toml was found)
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    /// Loader reading the global config from ~/.trellis
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.trellis/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration for the project enclosing `start_dir`
    ///
    /// The nearest trellis.toml at or above `start_dir` wins. Without one,
    /// the result carries an empty declaration and no project root.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, declared) = self.find_project_config(start_dir)?;
        self.assemble(project_root, declared)
    }

    /// Load configuration from an explicit trellis.toml path
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let declared = ProjectConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(Path::to_path_buf);
        self.assemble(project_root, declared)
    }

    /// Layer global defaults and environment overrides around a declaration
    fn assemble(
        &mut self,
        project_root: Option<PathBuf>,
        declared: ProjectConfig,
    ) -> ConfigResult<Config> {
        // An unreadable global file falls back to defaults
        let global = self.load_global_config().unwrap_or_default();
        let project = self.apply_env_overrides(declared)?;

        Ok(Config {
            project,
            global,
            project_root,
        })
    }

    /// Walk up from `start_dir` to the nearest trellis.toml
    ///
    /// Relative start directories are anchored at the working directory so
    /// the walk can pass above it.
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = if start_dir.is_absolute() {
            start_dir.to_path_buf()
        } else {
            env::current_dir()?.join(start_dir)
        };

        loop {
            let candidate = current.join(PROJECT_FILE_NAME);
            if candidate.is_file() {
                let declared = ProjectConfig::load_from_file(&candidate)?;
                return Ok((Some(current), declared));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration from ~/.trellis/config.toml
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        let path = match &self.global_config_path {
            Some(path) => path.clone(),
            None => {
                let path = GlobalConfig::global_config_path()?;
                self.global_config_path = Some(path.clone());
                path
            }
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        GlobalConfig::load_from_file(&path)
    }

    /// Apply TRELLIS_* overrides
    fn apply_env_overrides(&self, mut config: ProjectConfig) -> ConfigResult<ProjectConfig> {
        if let Ok(build_dir) = env::var(BUILD_DIR_ENV) {
            if build_dir.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: BUILD_DIR_ENV.to_string(),
                    reason: "path cannot be empty".to_string(),
                });
            }
            config.set_build_dir(PathBuf::from(build_dir));
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Configuration for a project rooted at `root` with no declarations
    pub fn empty(root: impl Into<PathBuf>) -> Self {
        Self {
            project: ProjectConfig::default(),
            global: GlobalConfig::default(),
            project_root: Some(root.into()),
        }
    }

    /// Get the project root directory
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has trellis.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }

    /// Effective root project name (declared > root directory name > "root")
    pub fn project_name(&self) -> String {
        if let Some(name) = self.project.project_name() {
            return name.to_string();
        }
        self.project_root
            .as_deref()
            .and_then(|root| root.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string())
    }

    /// Effective root output directory (project > global > default)
    pub fn build_dir(&self) -> PathBuf {
        self.project
            .build_dir()
            .or_else(|| self.global.default_build_dir())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR))
    }

    /// Effective buildscript repositories (project > global defaults)
    pub fn buildscript_repositories(&self) -> &[RepositorySpec] {
        match &self.project.buildscript {
            Some(b) if !b.repositories.is_empty() => &b.repositories,
            _ => self.global.default_repositories(),
        }
    }

    /// Effective project repositories (project > global defaults)
    pub fn project_repositories(&self) -> &[RepositorySpec] {
        match &self.project.allprojects {
            Some(a) if !a.repositories.is_empty() => &a.repositories,
            _ => self.global.default_repositories(),
        }
    }

    /// Buildscript classpath coordinates as declared
    pub fn classpath_dependencies(&self) -> &[String] {
        self.project
            .buildscript
            .as_ref()
            .map(|b| b.dependencies.as_slice())
            .unwrap_or(&[])
    }
}
