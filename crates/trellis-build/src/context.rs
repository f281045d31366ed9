//! Configuration context: the single owner of all build-layout state
//!
//! A context is created fresh for every invocation, mutated only during the
//! configuration phase, and consumed by [`ConfigurationContext::resolve`],
//! which hands back an immutable [`ResolvedConfiguration`].

use crate::error::{BuildError, BuildResult};
use crate::evaluation::{EvaluationGraph, EvaluationOrderConstraint};
use crate::layout::{BuildDirectoryBinding, BuildLayout};
use crate::project::{normalize_project_name, ProjectTree};
use crate::repository::{Coordinate, Repository, RepositoryScope, RepositorySet};
use crate::tasks::{Task, TaskRegistry, TaskReport};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use trellis_config::Config;

/// Mutable configuration state for one build invocation
#[derive(Debug)]
pub struct ConfigurationContext {
    tree: ProjectTree,
    layout: BuildLayout,
    repositories: BTreeMap<RepositoryScope, RepositorySet>,
    classpath: Vec<Coordinate>,
    evaluation: EvaluationGraph,
    tasks: TaskRegistry,
    /// The `clean` task deletes whatever the root output directory ends up being
    clean_follows_root: bool,
}

impl ConfigurationContext {
    /// Create a context for a root project and its subprojects
    pub fn new<I, S>(
        project_root: impl Into<PathBuf>,
        root_name: impl Into<String>,
        subprojects: I,
    ) -> BuildResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tree = ProjectTree::new(root_name, subprojects)?;
        let evaluation = EvaluationGraph::new(tree.names().map(str::to_string));
        Ok(Self {
            layout: BuildLayout::new(project_root),
            tree,
            repositories: BTreeMap::new(),
            classpath: Vec::new(),
            evaluation,
            tasks: TaskRegistry::new(),
            clean_follows_root: false,
        })
    }

    /// Apply every declaration of a loaded configuration, in a fixed order
    pub fn from_config(project_root: impl Into<PathBuf>, config: &Config) -> BuildResult<Self> {
        config.project.validate()?;

        let mut context = Self::new(
            project_root,
            config.project_name(),
            config.project.subproject_names(),
        )?;

        let buildscript = config.buildscript_repositories();
        if !buildscript.is_empty() {
            context.configure_repositories(
                RepositoryScope::Buildscript,
                RepositorySet::from_specs(buildscript)?,
            )?;
        }

        for coordinate in config.classpath_dependencies() {
            context.add_classpath_dependency(coordinate)?;
        }

        let project = config.project_repositories();
        if !project.is_empty() {
            context.configure_repositories(
                RepositoryScope::Project,
                RepositorySet::from_specs(project)?,
            )?;
        }

        context.set_root_output_directory(config.build_dir())?;
        context.bind_all_subprojects()?;

        if let Some(dependency) = config
            .project
            .subprojects
            .as_ref()
            .and_then(|s| s.evaluation_depends_on.as_deref())
        {
            context.declare_evaluation_dependency_for_all(dependency)?;
        }

        for edge in &config.project.evaluation {
            context.declare_evaluation_dependency(&edge.dependent, &edge.depends_on)?;
        }

        context.register_clean_task(config.project.clean_target())?;

        Ok(context)
    }

    /// The project tree
    pub fn tree(&self) -> &ProjectTree {
        &self.tree
    }

    /// The output layout so far
    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Declare the ordered repositories for a scope
    ///
    /// Each scope may be declared once per context.
    pub fn configure_repositories<I>(&mut self, scope: RepositoryScope, repositories: I) -> BuildResult<()>
    where
        I: IntoIterator<Item = Repository>,
    {
        if self.repositories.contains_key(&scope) {
            return Err(BuildError::configuration(format!(
                "{} repositories are already declared",
                scope
            )));
        }
        let set: RepositorySet = repositories.into_iter().collect();
        debug!(%scope, count = set.len(), "repositories configured");
        self.repositories.insert(scope, set);
        Ok(())
    }

    /// Repositories declared for a scope
    pub fn repositories(&self, scope: RepositoryScope) -> Option<&RepositorySet> {
        self.repositories.get(&scope)
    }

    /// Add a buildscript classpath coordinate (`group:artifact:version`)
    pub fn add_classpath_dependency(&mut self, coordinate: &str) -> BuildResult<()> {
        let coordinate = Coordinate::parse(coordinate)?;
        if !self.classpath.contains(&coordinate) {
            debug!(%coordinate, "classpath dependency added");
            self.classpath.push(coordinate);
        }
        Ok(())
    }

    /// Set the root output directory; must precede every subproject binding
    pub fn set_root_output_directory(&mut self, path: impl Into<PathBuf>) -> BuildResult<()> {
        self.layout.set_root_output_directory(path)
    }

    /// Bind one subproject to `<root output>/<name>`
    pub fn bind_subproject_output_directory(&mut self, name: &str) -> BuildResult<PathBuf> {
        let name = normalize_project_name(name);
        if name.trim().is_empty() {
            return Err(BuildError::configuration("subproject name cannot be empty"));
        }
        let node = self
            .tree
            .subproject(name)
            .ok_or_else(|| {
                BuildError::configuration(format!("'{}' is not a declared subproject", name))
            })?
            .clone();
        self.layout.bind(&node).map(Path::to_path_buf)
    }

    /// Bind every subproject, in declaration order
    pub fn bind_all_subprojects(&mut self) -> BuildResult<()> {
        let names: Vec<String> = self
            .tree
            .subprojects()
            .iter()
            .map(|node| node.name.clone())
            .collect();
        for name in names {
            self.bind_subproject_output_directory(&name)?;
        }
        Ok(())
    }

    /// Declare that `dependent` is evaluated after `dependency`
    pub fn declare_evaluation_dependency(&mut self, dependent: &str, dependency: &str) -> BuildResult<()> {
        let dependent = normalize_project_name(dependent);
        let dependency = normalize_project_name(dependency);
        if self.evaluation.declare(dependent, dependency)? {
            debug!(dependent, dependency, "evaluation dependency declared");
        }
        Ok(())
    }

    /// Make every subproject other than `dependency` evaluate after it
    pub fn declare_evaluation_dependency_for_all(&mut self, dependency: &str) -> BuildResult<()> {
        let dependency = normalize_project_name(dependency).to_string();
        let dependents: Vec<String> = self
            .tree
            .subprojects()
            .iter()
            .filter(|node| node.name != dependency)
            .map(|node| node.name.clone())
            .collect();
        for dependent in dependents {
            self.declare_evaluation_dependency(&dependent, &dependency)?;
        }
        Ok(())
    }

    /// Register the `clean` task, deleting `target` or the root output directory
    ///
    /// Without an explicit target the task deletes the root output directory
    /// as it stands when the context is resolved.
    pub fn register_clean_task(&mut self, target: Option<&Path>) -> BuildResult<()> {
        let task = match target {
            Some(path) => Task::clean(self.layout.resolve(path)),
            None => Task::clean(self.layout.resolved_root_output_directory()),
        };
        self.tasks.register(task)?;
        self.clean_follows_root = target.is_none();
        Ok(())
    }

    /// Register an arbitrary task
    pub fn register_task(&mut self, task: Task) -> BuildResult<()> {
        self.tasks.register(task)
    }

    /// Finish the configuration phase
    ///
    /// Any subproject not yet bound is bound under the current root.
    pub fn resolve(mut self) -> BuildResult<ResolvedConfiguration> {
        self.bind_all_subprojects()?;
        if self.clean_follows_root {
            self.tasks
                .replace(Task::clean(self.layout.resolved_root_output_directory()));
        }

        let evaluation_order = self.evaluation.evaluation_order();
        let evaluation_waves = self.evaluation.evaluation_waves();
        let root_output_directory = self.layout.root_output_directory().to_path_buf();
        let resolved_root_output_directory = self.layout.resolved_root_output_directory();
        let project_root = self.layout.project_root().to_path_buf();

        info!(
            root = %self.tree.root().name,
            subprojects = self.tree.subprojects().len(),
            output = %root_output_directory.display(),
            "configuration resolved"
        );

        Ok(ResolvedConfiguration {
            project_root,
            root_project: self.tree.root().name.clone(),
            root_output_directory,
            resolved_root_output_directory,
            buildscript_repositories: self
                .repositories
                .remove(&RepositoryScope::Buildscript)
                .unwrap_or_default(),
            project_repositories: self
                .repositories
                .remove(&RepositoryScope::Project)
                .unwrap_or_default(),
            classpath: self.classpath,
            bindings: self.layout.into_bindings(),
            constraints: self.evaluation.constraints().to_vec(),
            evaluation_order,
            evaluation_waves,
            tasks: self.tasks,
        })
    }
}

/// Read-only result of the configuration phase
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfiguration {
    project_root: PathBuf,
    root_project: String,
    root_output_directory: PathBuf,
    resolved_root_output_directory: PathBuf,
    buildscript_repositories: RepositorySet,
    project_repositories: RepositorySet,
    classpath: Vec<Coordinate>,
    bindings: Vec<BuildDirectoryBinding>,
    constraints: Vec<EvaluationOrderConstraint>,
    evaluation_order: Vec<String>,
    evaluation_waves: Vec<Vec<String>>,
    tasks: TaskRegistry,
}

impl ResolvedConfiguration {
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn root_project(&self) -> &str {
        &self.root_project
    }

    /// Root output directory as declared
    pub fn root_output_directory(&self) -> &Path {
        &self.root_output_directory
    }

    /// Root output directory resolved against the project root
    pub fn resolved_root_output_directory(&self) -> &Path {
        &self.resolved_root_output_directory
    }

    /// Repositories for a scope, empty if the scope was never declared
    pub fn repositories(&self, scope: RepositoryScope) -> &RepositorySet {
        match scope {
            RepositoryScope::Buildscript => &self.buildscript_repositories,
            RepositoryScope::Project => &self.project_repositories,
        }
    }

    /// Buildscript classpath coordinates
    pub fn classpath(&self) -> &[Coordinate] {
        &self.classpath
    }

    /// Subproject bindings in declaration order
    pub fn bindings(&self) -> &[BuildDirectoryBinding] {
        &self.bindings
    }

    /// Bindings as a name → declared path map
    pub fn binding_map(&self) -> BTreeMap<&str, &Path> {
        self.bindings
            .iter()
            .map(|b| (b.project.as_str(), b.output_directory.as_path()))
            .collect()
    }

    /// Declared output directory of a subproject
    pub fn output_directory(&self, project: &str) -> Option<&Path> {
        let project = normalize_project_name(project);
        self.bindings
            .iter()
            .find(|b| b.project == project)
            .map(|b| b.output_directory.as_path())
    }

    /// Output directory of a subproject resolved against the project root
    pub fn resolved_output_directory(&self, project: &str) -> Option<PathBuf> {
        self.output_directory(project).map(|path| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                self.project_root.join(path)
            }
        })
    }

    /// Accepted evaluation constraints in declaration order
    pub fn constraints(&self) -> &[EvaluationOrderConstraint] {
        &self.constraints
    }

    /// Projects in evaluation order, root and subprojects alike
    pub fn evaluation_order(&self) -> &[String] {
        &self.evaluation_order
    }

    /// Groups of projects that may be evaluated together
    pub fn evaluation_waves(&self) -> &[Vec<String>] {
        &self.evaluation_waves
    }

    /// Registered tasks
    pub fn tasks(&self) -> &[Task] {
        self.tasks.tasks()
    }

    /// Run a registered task by name
    pub fn run_task(&self, name: &str) -> BuildResult<TaskReport> {
        self.tasks.run(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn context(subprojects: &[&str]) -> ConfigurationContext {
        ConfigurationContext::new("/work/android", "android", subprojects.iter().copied()).unwrap()
    }

    #[test]
    fn test_reference_layout() {
        let mut ctx = context(&["app", "lib"]);
        ctx.set_root_output_directory("../build").unwrap();
        ctx.bind_all_subprojects().unwrap();
        let resolved = ctx.resolve().unwrap();

        let expected: BTreeMap<&str, &Path> = [
            ("app", Path::new("../build/app")),
            ("lib", Path::new("../build/lib")),
        ]
        .into_iter()
        .collect();
        assert_eq!(resolved.binding_map(), expected);
    }

    #[test]
    fn test_repository_scope_declared_once() {
        let mut ctx = context(&[]);
        ctx.configure_repositories(RepositoryScope::Project, vec![Repository::google()])
            .unwrap();
        let err = ctx
            .configure_repositories(RepositoryScope::Project, vec![Repository::maven_central()])
            .unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));

        ctx.configure_repositories(RepositoryScope::Buildscript, vec![Repository::google()])
            .unwrap();
    }

    #[test]
    fn test_bind_unknown_subproject() {
        let mut ctx = context(&["app"]);
        assert!(ctx.bind_subproject_output_directory("lib").is_err());
        assert!(ctx.bind_subproject_output_directory("").is_err());
    }

    #[test]
    fn test_root_change_after_binding() {
        let mut ctx = context(&["app"]);
        ctx.bind_subproject_output_directory(":app").unwrap();
        assert!(matches!(
            ctx.set_root_output_directory("../build"),
            Err(BuildError::Configuration(_))
        ));
    }

    #[test]
    fn test_broadcast_skips_the_target_itself() {
        let mut ctx = context(&["app", "lib", "feature"]);
        ctx.declare_evaluation_dependency_for_all(":app").unwrap();
        let resolved = ctx.resolve().unwrap();

        assert_eq!(resolved.constraints().len(), 2);
        let order = resolved.evaluation_order();
        let position = |name: &str| order.iter().position(|p| p == name).unwrap();
        assert!(position("app") < position("lib"));
        assert!(position("app") < position("feature"));
    }

    #[test]
    fn test_classpath_duplicates_collapse() {
        let mut ctx = context(&[]);
        ctx.add_classpath_dependency("com.google.gms:google-services:4.4.2")
            .unwrap();
        ctx.add_classpath_dependency("com.google.gms:google-services:4.4.2")
            .unwrap();
        assert!(ctx.add_classpath_dependency("google-services").is_err());

        let resolved = ctx.resolve().unwrap();
        assert_eq!(resolved.classpath().len(), 1);
    }

    #[test]
    fn test_clean_task_targets_resolved_root() {
        let mut ctx = context(&["app"]);
        ctx.set_root_output_directory("../build").unwrap();
        ctx.register_clean_task(None).unwrap();
        let resolved = ctx.resolve().unwrap();

        assert_eq!(
            resolved.tasks()[0].action,
            crate::tasks::TaskAction::Delete {
                targets: vec![PathBuf::from("/work/android/../build")]
            }
        );
    }

    #[test]
    fn test_default_clean_follows_later_root_change() {
        let mut ctx = context(&["app"]);
        ctx.register_clean_task(None).unwrap();
        ctx.set_root_output_directory("out").unwrap();
        let resolved = ctx.resolve().unwrap();

        assert_eq!(
            resolved.tasks()[0].action,
            crate::tasks::TaskAction::Delete {
                targets: vec![PathBuf::from("/work/android/out")]
            }
        );
        assert_eq!(
            resolved.resolved_output_directory("app"),
            Some(PathBuf::from("/work/android/out/app"))
        );
    }

    #[test]
    fn test_explicit_clean_target_is_kept() {
        let mut ctx = context(&[]);
        ctx.register_clean_task(Some(Path::new("dist"))).unwrap();
        ctx.set_root_output_directory("out").unwrap();
        let resolved = ctx.resolve().unwrap();

        assert_eq!(
            resolved.tasks()[0].action,
            crate::tasks::TaskAction::Delete {
                targets: vec![PathBuf::from("/work/android/dist")]
            }
        );
    }

    #[test]
    fn test_resolve_binds_remaining_subprojects() {
        let mut ctx = context(&["app", "lib"]);
        ctx.bind_subproject_output_directory("lib").unwrap();
        let resolved = ctx.resolve().unwrap();

        let names: Vec<&str> = resolved.bindings().iter().map(|b| b.project.as_str()).collect();
        assert_eq!(names, vec!["lib", "app"]);
        assert_eq!(
            resolved.resolved_output_directory("app"),
            Some(PathBuf::from("/work/android/build/app"))
        );
    }

    #[test]
    fn test_undeclared_scope_is_empty() {
        let resolved = context(&[]).resolve().unwrap();
        assert!(resolved.repositories(RepositoryScope::Buildscript).is_empty());
        assert!(resolved.repositories(RepositoryScope::Project).is_empty());
    }
}
