//! Trellis build layout manager
//!
//! Configures a multi-project build before any task runs:
//! - Ordered artifact repositories per scope (buildscript, project)
//! - A shared root output directory with one subdirectory per subproject
//! - Evaluation order constraints between projects, rejected if cyclic
//! - A `clean` task that deletes the root output directory
//!
//! All state lives in a [`ConfigurationContext`] created per invocation.
//! Resolving the context yields an immutable [`ResolvedConfiguration`].
//!
//! # Example
//!
//! ```
//! use trellis_build::ConfigurationContext;
//! use std::path::Path;
//!
//! let mut ctx = ConfigurationContext::new("/work/android", "android", ["app", "lib"]).unwrap();
//! ctx.set_root_output_directory("../build").unwrap();
//! ctx.bind_all_subprojects().unwrap();
//!
//! let resolved = ctx.resolve().unwrap();
//! assert_eq!(resolved.output_directory("app"), Some(Path::new("../build/app")));
//! ```

pub mod context;
pub mod error;
pub mod evaluation;
pub mod layout;
pub mod project;
pub mod repository;
pub mod tasks;

// Re-export main types
pub use context::{ConfigurationContext, ResolvedConfiguration};
pub use error::{BuildError, BuildResult};
pub use evaluation::{EvaluationGraph, EvaluationOrderConstraint};
pub use layout::{BuildDirectoryBinding, BuildLayout};
pub use project::{normalize_project_name, validate_subproject_name, ProjectNode, ProjectTree};
pub use repository::{ArtifactSource, Coordinate, Repository, RepositoryScope, RepositorySet};
pub use tasks::{
    delete_recursively, CleanOutcome, TargetOutcome, Task, TaskAction, TaskRegistry, TaskReport,
    CLEAN_TASK,
};

// Re-export trellis-config types for convenience
pub use trellis_config::Config;
