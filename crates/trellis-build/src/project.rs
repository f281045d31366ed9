//! Project tree: the root project and its materialized subprojects

use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Strip a single leading ':' from a Gradle-style project path
pub fn normalize_project_name(name: &str) -> &str {
    name.strip_prefix(':').unwrap_or(name)
}

/// Check that a subproject name is a single path component
///
/// Names become directories directly under the root output directory, so
/// anything that would resolve elsewhere is rejected.
pub fn validate_subproject_name(name: &str) -> BuildResult<()> {
    if name.trim().is_empty() {
        return Err(BuildError::configuration("subproject name cannot be empty"));
    }
    if name == "." || name == ".." {
        return Err(BuildError::configuration(format!(
            "'{}' is not a valid subproject name",
            name
        )));
    }
    if let Some(c) = name.chars().find(|c| matches!(*c, '/' | '\\' | ':')) {
        return Err(BuildError::configuration(format!(
            "subproject name '{}' cannot contain '{}'",
            name, c
        )));
    }
    if Path::new(name).is_absolute() {
        return Err(BuildError::configuration(format!(
            "subproject name '{}' cannot be an absolute path",
            name
        )));
    }
    Ok(())
}

/// A project in the tree
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ProjectNode {
    /// Project name (unique in the tree)
    pub name: String,
    /// Owning root project, `None` for the root itself
    pub parent: Option<String>,
}

impl ProjectNode {
    /// Create the root project node
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
        }
    }

    /// Create a subproject node owned by `root`
    pub fn subproject(name: impl Into<String>, root: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: Some(root.into()),
        }
    }

    /// Check if this is the root project
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// The root project plus its subprojects, in declaration order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectTree {
    root: ProjectNode,
    subprojects: Vec<ProjectNode>,
}

impl ProjectTree {
    /// Build a tree, rejecting empty or duplicate subproject names
    pub fn new<I, S>(root_name: impl Into<String>, subprojects: I) -> BuildResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let root_name = root_name.into();
        if root_name.trim().is_empty() {
            return Err(BuildError::configuration("root project name cannot be empty"));
        }

        let mut seen = HashSet::new();
        let mut nodes = Vec::new();
        for name in subprojects {
            let name = normalize_project_name(name.as_ref());
            validate_subproject_name(name)?;
            if name == root_name {
                return Err(BuildError::configuration(format!(
                    "subproject '{}' has the same name as the root project",
                    name
                )));
            }
            if !seen.insert(name.to_string()) {
                return Err(BuildError::configuration(format!(
                    "subproject '{}' is declared more than once",
                    name
                )));
            }
            nodes.push(ProjectNode::subproject(name, root_name.as_str()));
        }

        Ok(Self {
            root: ProjectNode::root(root_name),
            subprojects: nodes,
        })
    }

    /// The root project
    pub fn root(&self) -> &ProjectNode {
        &self.root
    }

    /// Subprojects in declaration order
    pub fn subprojects(&self) -> &[ProjectNode] {
        &self.subprojects
    }

    /// Get a subproject by name
    pub fn subproject(&self, name: &str) -> Option<&ProjectNode> {
        let name = normalize_project_name(name);
        self.subprojects.iter().find(|node| node.name == name)
    }

    /// Get any project (root or subproject) by name
    pub fn get(&self, name: &str) -> Option<&ProjectNode> {
        let name = normalize_project_name(name);
        if name == self.root.name {
            Some(&self.root)
        } else {
            self.subproject(name)
        }
    }

    /// All project names, root first
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.root.name.as_str())
            .chain(self.subprojects.iter().map(|node| node.name.as_str()))
    }

    /// Number of projects including the root
    pub fn project_count(&self) -> usize {
        self.subprojects.len() + 1
    }
}
