//! Build output directory layout
//!
//! Every subproject writes into `<root output>/<name>`. The root output
//! directory must be settled before the first subproject is bound; changing
//! it afterwards would leave earlier bindings pointing at the old location,
//! so it is rejected.

use crate::error::{BuildError, BuildResult};
use crate::project::{validate_subproject_name, ProjectNode};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::debug;
use trellis_config::loader::DEFAULT_BUILD_DIR;

/// A subproject's output directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuildDirectoryBinding {
    /// Subproject name
    pub project: String,
    /// Output directory as declared (relative to the project root unless absolute)
    pub output_directory: PathBuf,
}

/// Output directory assignments for one configuration run
#[derive(Debug, Clone)]
pub struct BuildLayout {
    project_root: PathBuf,
    root_output: PathBuf,
    bindings: Vec<BuildDirectoryBinding>,
}

impl BuildLayout {
    /// Create a layout using the default root output directory
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: project_root.into(),
            root_output: PathBuf::from(DEFAULT_BUILD_DIR),
            bindings: Vec::new(),
        }
    }

    /// Project root directory
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Set the root output directory
    ///
    /// Fails once any subproject has been bound.
    pub fn set_root_output_directory(&mut self, path: impl Into<PathBuf>) -> BuildResult<()> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(BuildError::configuration(
                "root output directory cannot be empty",
            ));
        }
        if let Some(first) = self.bindings.first() {
            return Err(BuildError::configuration(format!(
                "root output directory cannot change to {} after subproject '{}' was bound to {}",
                path.display(),
                first.project,
                first.output_directory.display()
            )));
        }
        debug!(path = %path.display(), "root output directory set");
        self.root_output = path;
        Ok(())
    }

    /// Root output directory as declared
    pub fn root_output_directory(&self) -> &Path {
        &self.root_output
    }

    /// Root output directory resolved against the project root
    pub fn resolved_root_output_directory(&self) -> PathBuf {
        self.resolve(&self.root_output)
    }

    /// Resolve a declared path against the project root
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }

    /// Bind a subproject to `<root output>/<name>`
    ///
    /// Binding the same subproject again returns the existing path.
    pub fn bind(&mut self, node: &ProjectNode) -> BuildResult<&Path> {
        if node.name.trim().is_empty() {
            return Err(BuildError::configuration(
                "cannot bind an output directory for an unnamed project",
            ));
        }
        validate_subproject_name(&node.name)?;
        if node.is_root() {
            return Err(BuildError::configuration(format!(
                "'{}' is the root project; its output directory is the root output directory",
                node.name
            )));
        }

        let index = match self.bindings.iter().position(|b| b.project == node.name) {
            Some(index) => index,
            None => {
                let output_directory = self.root_output.join(&node.name);
                debug!(
                    project = %node.name,
                    output = %output_directory.display(),
                    "bound subproject output directory"
                );
                self.bindings.push(BuildDirectoryBinding {
                    project: node.name.clone(),
                    output_directory,
                });
                self.bindings.len() - 1
            }
        };

        Ok(&self.bindings[index].output_directory)
    }

    /// Bindings in the order they were made
    pub fn bindings(&self) -> &[BuildDirectoryBinding] {
        &self.bindings
    }

    /// Output directory of a bound subproject
    pub fn output_directory(&self, project: &str) -> Option<&Path> {
        self.bindings
            .iter()
            .find(|b| b.project == project)
            .map(|b| b.output_directory.as_path())
    }

    pub(crate) fn into_bindings(self) -> Vec<BuildDirectoryBinding> {
        self.bindings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sub(name: &str) -> ProjectNode {
        ProjectNode::subproject(name, "android")
    }

    #[test]
    fn test_default_root_output() {
        let layout = BuildLayout::new("/work/android");
        assert_eq!(layout.root_output_directory(), Path::new("build"));
        assert_eq!(
            layout.resolved_root_output_directory(),
            PathBuf::from("/work/android/build")
        );
    }

    #[test]
    fn test_bind_under_relative_root() {
        let mut layout = BuildLayout::new("/work/android");
        layout.set_root_output_directory("../build").unwrap();

        assert_eq!(layout.bind(&sub("app")).unwrap(), Path::new("../build/app"));
        assert_eq!(layout.bind(&sub("lib")).unwrap(), Path::new("../build/lib"));
        assert_eq!(
            layout.resolve(layout.output_directory("app").unwrap()),
            PathBuf::from("/work/android/../build/app")
        );
    }

    #[test]
    fn test_absolute_root_is_not_rebased() {
        let mut layout = BuildLayout::new("/work/android");
        layout.set_root_output_directory("/var/out").unwrap();
        assert_eq!(
            layout.resolved_root_output_directory(),
            PathBuf::from("/var/out")
        );
    }

    #[test]
    fn test_bind_is_idempotent() {
        let mut layout = BuildLayout::new("/work/android");
        let first = layout.bind(&sub("app")).unwrap().to_path_buf();
        let second = layout.bind(&sub("app")).unwrap().to_path_buf();
        assert_eq!(first, second);
        assert_eq!(layout.bindings().len(), 1);
    }

    #[test]
    fn test_root_change_after_binding_rejected() {
        let mut layout = BuildLayout::new("/work/android");
        layout.bind(&sub("app")).unwrap();

        let err = layout.set_root_output_directory("../build").unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));
        assert_eq!(layout.output_directory("app"), Some(Path::new("build/app")));
    }

    #[test]
    fn test_root_change_before_binding_last_wins() {
        let mut layout = BuildLayout::new("/work/android");
        layout.set_root_output_directory("out").unwrap();
        layout.set_root_output_directory("../build").unwrap();
        assert_eq!(layout.root_output_directory(), Path::new("../build"));
    }

    #[test]
    fn test_bind_root_rejected() {
        let mut layout = BuildLayout::new("/work/android");
        assert!(layout.bind(&ProjectNode::root("android")).is_err());
    }

    #[test]
    fn test_bind_unnamed_rejected() {
        let mut layout = BuildLayout::new("/work/android");
        assert!(layout.bind(&sub("")).is_err());
    }

    #[test]
    fn test_bind_path_like_name_rejected() {
        let mut layout = BuildLayout::new("/work/android");
        layout.set_root_output_directory("../build").unwrap();
        assert!(layout.bind(&sub("/etc")).is_err());
        assert!(layout.bind(&sub("../escape")).is_err());
        assert!(layout.bind(&sub("a/b")).is_err());
        assert!(layout.bindings().is_empty());
    }

    #[test]
    fn test_empty_root_rejected() {
        let mut layout = BuildLayout::new("/work/android");
        assert!(layout.set_root_output_directory("").is_err());
    }
}
