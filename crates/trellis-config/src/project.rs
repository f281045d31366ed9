//! Project Configuration (trellis.toml)
//!
//! Handles the static build-layout declarations stored in `trellis.toml` at
//! the project root.

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Repository shorthands accepted in place of a `{ name, url }` table
pub const WELL_KNOWN_REPOSITORIES: &[&str] =
    &["google", "maven-central", "gradle-plugin-portal", "maven-local"];

/// Project configuration from trellis.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Root project settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<RootProjectConfig>,

    /// Plugin and classpath resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buildscript: Option<BuildscriptConfig>,

    /// Repositories shared by every project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allprojects: Option<AllProjectsConfig>,

    /// Subproject list and broadcast declarations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subprojects: Option<SubprojectsConfig>,

    /// Explicit evaluation ordering edges, in declaration order
    #[serde(default)]
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evaluation: Vec<EvaluationDeclaration>,

    /// Task overrides
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<TasksConfig>,
}

/// Root project settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RootProjectConfig {
    /// Root project name (default: project directory name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Root output directory (default: "build")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_dir: Option<PathBuf>,
}

/// `[buildscript]` block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct BuildscriptConfig {
    /// Repositories consulted for plugins, in order
    #[serde(default)]
    pub repositories: Vec<RepositorySpec>,

    /// Classpath coordinates (group:artifact:version)
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// `[allprojects]` block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct AllProjectsConfig {
    /// Repositories consulted for every project's dependencies, in order
    #[serde(default)]
    pub repositories: Vec<RepositorySpec>,
}

/// `[subprojects]` block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct SubprojectsConfig {
    /// Subproject names, in declaration order
    #[serde(default)]
    pub include: Vec<String>,

    /// Project every other subproject is evaluated after
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evaluation_depends_on: Option<String>,
}

/// One `[[evaluation]]` edge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct EvaluationDeclaration {
    /// Project whose evaluation waits
    pub dependent: String,

    /// Project evaluated first
    pub depends_on: String,
}

/// `[tasks]` block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct TasksConfig {
    /// Clean task settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clean: Option<CleanTaskConfig>,
}

/// `[tasks.clean]` block
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct CleanTaskConfig {
    /// Path deleted by `clean` (default: root output directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
}

/// Repository declaration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RepositorySpec {
    /// Well-known shorthand (e.g., "google")
    Named(String),

    /// Custom repository
    Custom {
        /// Display name
        name: String,
        /// Base URL
        url: String,
    },
}

impl RepositorySpec {
    /// Name of the repository
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Custom { name, .. } => name,
        }
    }

    pub(crate) fn validate(&self, field: &str) -> ConfigResult<()> {
        match self {
            Self::Named(name) => {
                if !WELL_KNOWN_REPOSITORIES.contains(&name.as_str()) {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: format!(
                            "unknown repository '{}', expected one of {} or a {{ name, url }} table",
                            name,
                            WELL_KNOWN_REPOSITORIES.join(", ")
                        ),
                    });
                }
            }
            Self::Custom { name, url } => {
                if name.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: "repository name cannot be empty".to_string(),
                    });
                }
                if url.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: field.to_string(),
                        reason: format!("repository '{}' has an empty url", name),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A name usable as one directory under the root output directory
fn is_single_component(name: &str) -> bool {
    name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
        && !Path::new(name).is_absolute()
}

impl ProjectConfig {
    /// Load project configuration from a file
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

    /// Validate the project configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(name) = self.project.as_ref().and_then(|p| p.name.as_ref()) {
            if name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "project.name".to_string(),
                    reason: "name cannot be empty".to_string(),
                });
            }
        }

        if let Some(buildscript) = &self.buildscript {
            for repo in &buildscript.repositories {
                repo.validate("buildscript.repositories")?;
            }
        }

        if let Some(all) = &self.allprojects {
            for repo in &all.repositories {
                repo.validate("allprojects.repositories")?;
            }
        }

        if let Some(subprojects) = &self.subprojects {
            let mut seen = HashSet::new();
            for name in &subprojects.include {
                let normalized = name.strip_prefix(':').unwrap_or(name);
                if normalized.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        field: "subprojects.include".to_string(),
                        reason: "subproject name cannot be empty".to_string(),
                    });
                }
                if !is_single_component(normalized) {
                    return Err(ConfigError::InvalidValue {
                        field: "subprojects.include".to_string(),
                        reason: format!(
                            "subproject '{}' must be a plain directory name, not a path",
                            normalized
                        ),
                    });
                }
                if !seen.insert(normalized) {
                    return Err(ConfigError::InvalidValue {
                        field: "subprojects.include".to_string(),
                        reason: format!("subproject '{}' is declared more than once", normalized),
                    });
                }
            }
        }

        for edge in &self.evaluation {
            if edge.dependent.is_empty() || edge.depends_on.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "evaluation".to_string(),
                    reason: "both 'dependent' and 'depends-on' must name a project".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Root project name, if declared
    pub fn project_name(&self) -> Option<&str> {
        self.project.as_ref().and_then(|p| p.name.as_deref())
    }

    /// Declared root output directory, if any
    pub fn build_dir(&self) -> Option<&Path> {
        self.project.as_ref().and_then(|p| p.build_dir.as_deref())
    }

    /// Declared subproject names, in order
    pub fn subproject_names(&self) -> &[String] {
        self.subprojects
            .as_ref()
            .map(|s| s.include.as_slice())
            .unwrap_or(&[])
    }

    /// Clean task target override, if any
    pub fn clean_target(&self) -> Option<&Path> {
        self.tasks
            .as_ref()
            .and_then(|t| t.clean.as_ref())
            .and_then(|c| c.target.as_deref())
    }

    /// Set the root output directory, creating the `[project]` table if needed
    pub fn set_build_dir(&mut self, build_dir: PathBuf) {
        self.project.get_or_insert_with(Default::default).build_dir = Some(build_dir);
    }
}
