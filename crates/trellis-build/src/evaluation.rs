//! Evaluation order constraints between projects
//!
//! An edge `dependent -> dependency` means the dependency's configuration is
//! evaluated first. Edges are checked for reachability before insertion, so
//! the graph is acyclic at every point and a topological order always exists.
use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

/// A declared ordering edge
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct EvaluationOrderConstraint {
    /// Project evaluated later
    pub dependent: String,
    /// Project evaluated first
    pub dependency: String,
}

/// Acyclic graph of evaluation constraints
#[derive(Debug, Clone, Default)]
pub struct EvaluationGraph {
    /// Projects in declaration order (tie-break for ordering)
    projects: Vec<String>,
    /// Dependencies per project, in declaration order
    dependencies: HashMap<String, Vec<String>>,
    /// Every accepted edge, in declaration order
    constraints: Vec<EvaluationOrderConstraint>,
}

impl EvaluationGraph {
    /// Create a graph over the given projects
    pub fn new<I, S>(projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let projects: Vec<String> = projects.into_iter().map(Into::into).collect();
        let dependencies = projects
            .iter()
            .map(|name| (name.clone(), Vec::new()))
            .collect();
        Self {
            projects,
            dependencies,
            constraints: Vec::new(),
        }
    }

    /// Check if a project is part of the graph
    pub fn contains(&self, project: &str) -> bool {
        self.dependencies.contains_key(project)
    }

    /// Record that `dependent` is evaluated after `dependency`
    ///
    /// Returns `false` if the edge already existed. Fails without modifying
    /// the graph if either project is unknown or the edge would close a cycle.
    pub fn declare(&mut self, dependent: &str, dependency: &str) -> BuildResult<bool> {
        for project in [dependent, dependency] {
            if !self.contains(project) {
                return Err(BuildError::configuration(format!(
                    "project '{}' not found in the project tree",
                    project
                )));
            }
        }

        if self.dependencies_of(dependent).iter().any(|d| d == dependency) {
            return Ok(false);
        }

        if let Some(path) = self.find_path(dependency, dependent) {
            let cycle = std::iter::once(dependent.to_string())
                .chain(path)
                .collect::<Vec<_>>()
                .join(" -> ");
            return Err(BuildError::CyclicDependency {
                dependent: dependent.to_string(),
                dependency: dependency.to_string(),
                cycle,
            });
        }

        if let Some(deps) = self.dependencies.get_mut(dependent) {
            deps.push(dependency.to_string());
        }
        self.constraints.push(EvaluationOrderConstraint {
            dependent: dependent.to_string(),
            dependency: dependency.to_string(),
        });
        Ok(true)
    }

    /// Direct dependencies of a project
    pub fn dependencies_of(&self, project: &str) -> &[String] {
        self.dependencies
            .get(project)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Accepted edges in declaration order
    pub fn constraints(&self) -> &[EvaluationOrderConstraint] {
        &self.constraints
    }

    /// Path `from -> ... -> to` following dependency edges, if one exists
    fn find_path(&self, from: &str, to: &str) -> Option<Vec<String>> {
        let mut visited = HashSet::new();
        let mut path = Vec::new();
        if self.dfs_find_path(from, to, &mut visited, &mut path) {
            Some(path)
        } else {
            None
        }
    }

    fn dfs_find_path(
        &self,
        current: &str,
        target: &str,
        visited: &mut HashSet<String>,
        path: &mut Vec<String>,
    ) -> bool {
        path.push(current.to_string());
        if current == target {
            return true;
        }
        if visited.insert(current.to_string()) {
            for dep in self.dependencies_of(current) {
                if self.dfs_find_path(dep, target, visited, path) {
                    return true;
                }
            }
        }
        path.pop();
        false
    }

    /// Topological evaluation order using Kahn's algorithm
    ///
    /// Ties are broken by declaration order, so the result is deterministic.
    pub fn evaluation_order(&self) -> Vec<String> {
        let mut remaining: HashMap<&str, usize> = self
            .projects
            .iter()
            .map(|name| (name.as_str(), self.dependencies_of(name).len()))
            .collect();

        let mut queue: VecDeque<&str> = self
            .projects
            .iter()
            .map(String::as_str)
            .filter(|name| remaining[name] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.projects.len());
        while let Some(current) = queue.pop_front() {
            order.push(current.to_string());

            for dependent in &self.projects {
                if self.dependencies_of(dependent).iter().any(|d| d == current) {
                    if let Some(degree) = remaining.get_mut(dependent.as_str()) {
                        *degree -= 1;
                        if *degree == 0 {
                            queue.push_back(dependent.as_str());
                        }
                    }
                }
            }
        }

        debug_assert_eq!(order.len(), self.projects.len(), "graph must stay acyclic");
        order
    }

    /// Groups of projects whose constraints are all satisfied by earlier groups
    pub fn evaluation_waves(&self) -> Vec<Vec<String>> {
        let mut waves = Vec::new();
        let mut done: HashSet<&str> = HashSet::new();

        loop {
            let wave: Vec<&str> = self
                .projects
                .iter()
                .map(String::as_str)
                .filter(|name| !done.contains(name))
                .filter(|name| {
                    self.dependencies_of(name)
                        .iter()
                        .all(|d| done.contains(d.as_str()))
                })
                .collect();

            if wave.is_empty() {
                break;
            }

            done.extend(wave.iter().copied());
            waves.push(wave.into_iter().map(str::to_string).collect());
        }

        waves
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn graph(names: &[&str]) -> EvaluationGraph {
        EvaluationGraph::new(names.iter().copied())
    }

    #[test]
    fn test_no_constraints_keeps_declaration_order() {
        let g = graph(&["root", "app", "lib"]);
        assert_eq!(g.evaluation_order(), vec!["root", "app", "lib"]);
        assert_eq!(g.evaluation_waves(), vec![vec!["root", "app", "lib"]]);
    }

    #[test]
    fn test_linear_chain() {
        let mut g = graph(&["a", "b", "c"]);
        g.declare("a", "b").unwrap();
        g.declare("b", "c").unwrap();
        assert_eq!(g.evaluation_order(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_diamond() {
        let mut g = graph(&["a", "b", "c", "d"]);
        g.declare("a", "b").unwrap();
        g.declare("a", "c").unwrap();
        g.declare("b", "d").unwrap();
        g.declare("c", "d").unwrap();

        assert_eq!(g.evaluation_order(), vec!["d", "b", "c", "a"]);
        assert_eq!(
            g.evaluation_waves(),
            vec![vec!["d"], vec!["b", "c"], vec!["a"]]
        );
    }

    #[test]
    fn test_two_node_cycle_rejected() {
        let mut g = graph(&["app", "lib"]);
        g.declare("app", "lib").unwrap();

        match g.declare("lib", "app") {
            Err(BuildError::CyclicDependency {
                dependent,
                dependency,
                cycle,
            }) => {
                assert_eq!(dependent, "lib");
                assert_eq!(dependency, "app");
                assert_eq!(cycle, "lib -> app -> lib");
            }
            other => panic!("Expected CyclicDependency error, got {:?}", other),
        }
        assert_eq!(g.constraints().len(), 1);
    }

    #[test]
    fn test_long_cycle_reports_path() {
        let mut g = graph(&["a", "b", "c"]);
        g.declare("a", "b").unwrap();
        g.declare("b", "c").unwrap();

        let err = g.declare("c", "a").unwrap_err();
        match err {
            BuildError::CyclicDependency { cycle, .. } => {
                assert_eq!(cycle, "c -> a -> b -> c");
            }
            other => panic!("Expected CyclicDependency error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_dependency_is_cycle() {
        let mut g = graph(&["app"]);
        assert!(matches!(
            g.declare("app", "app"),
            Err(BuildError::CyclicDependency { .. })
        ));
    }

    #[test]
    fn test_duplicate_edge_is_no_op() {
        let mut g = graph(&["app", "lib"]);
        assert!(g.declare("lib", "app").unwrap());
        assert!(!g.declare("lib", "app").unwrap());
        assert_eq!(g.dependencies_of("lib"), ["app"]);
        assert_eq!(g.constraints().len(), 1);
    }

    #[test]
    fn test_unknown_project_rejected() {
        let mut g = graph(&["app"]);
        let err = g.declare("app", "missing").unwrap_err();
        assert!(matches!(err, BuildError::Configuration(_)));
        assert!(err.to_string().contains("missing"));
    }
}
