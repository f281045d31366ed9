//! Named tasks registered during configuration and run afterwards

use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name of the task that deletes generated output
pub const CLEAN_TASK: &str = "clean";

/// What a task does when run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TaskAction {
    /// Recursively delete every target
    Delete { targets: Vec<PathBuf> },
}

/// A registered task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub name: String,
    pub description: String,
    pub action: TaskAction,
}

impl Task {
    /// Create a task
    pub fn new(name: impl Into<String>, description: impl Into<String>, action: TaskAction) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            action,
        }
    }

    /// The `clean` task deleting `target`
    pub fn clean(target: impl Into<PathBuf>) -> Self {
        let target = target.into();
        Self::new(
            CLEAN_TASK,
            format!("Deletes {}", target.display()),
            TaskAction::Delete {
                targets: vec![target],
            },
        )
    }
}

/// Result of deleting one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleanOutcome {
    /// The target existed and was deleted
    Removed,
    /// Nothing was there to delete
    AlreadyAbsent,
}

/// Per-target outcome of a task run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetOutcome {
    pub path: PathBuf,
    pub outcome: CleanOutcome,
}

/// Outcome of running a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    pub task: String,
    pub targets: Vec<TargetOutcome>,
}

impl TaskReport {
    /// Check if anything was deleted
    pub fn removed_anything(&self) -> bool {
        self.targets
            .iter()
            .any(|t| t.outcome == CleanOutcome::Removed)
    }
}

/// Tasks by name, in registration order
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct TaskRegistry {
    tasks: Vec<Task>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task; names must be unique
    pub fn register(&mut self, task: Task) -> BuildResult<()> {
        if task.name.trim().is_empty() {
            return Err(BuildError::configuration("task name cannot be empty"));
        }
        if self.get(&task.name).is_some() {
            return Err(BuildError::configuration(format!(
                "task '{}' is already registered",
                task.name
            )));
        }
        debug!(task = %task.name, "registered task");
        self.tasks.push(task);
        Ok(())
    }

    /// Register a task, replacing any task with the same name in place
    pub(crate) fn replace(&mut self, task: Task) {
        match self.tasks.iter_mut().find(|existing| existing.name == task.name) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
    }

    /// Get a task by name
    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.name == name)
    }

    /// Registered tasks in registration order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Registered task names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|task| task.name.as_str()).collect()
    }

    /// Run a task by name
    pub fn run(&self, name: &str) -> BuildResult<TaskReport> {
        let task = self
            .get(name)
            .ok_or_else(|| BuildError::task_not_found(name))?;

        info!(task = %task.name, "running task");
        match &task.action {
            TaskAction::Delete { targets } => {
                let targets = targets
                    .iter()
                    .map(|path| {
                        delete_recursively(path).map(|outcome| TargetOutcome {
                            path: path.clone(),
                            outcome,
                        })
                    })
                    .collect::<BuildResult<Vec<_>>>()?;
                Ok(TaskReport {
                    task: task.name.clone(),
                    targets,
                })
            }
        }
    }
}

/// Delete `path` and everything beneath it
///
/// A missing path counts as success. Symlinks are removed, not followed.
pub fn delete_recursively(path: &Path) -> BuildResult<CleanOutcome> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "nothing to delete");
            return Ok(CleanOutcome::AlreadyAbsent);
        }
        Err(e) => return Err(BuildError::filesystem(path, e)),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            info!(path = %path.display(), "deleted");
            Ok(CleanOutcome::Removed)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(CleanOutcome::AlreadyAbsent),
        Err(e) => Err(BuildError::filesystem(path, e)),
    }
}
