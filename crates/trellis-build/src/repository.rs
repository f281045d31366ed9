//! Artifact repositories and classpath coordinates
//!
//! A [`RepositorySet`] is the ordered list of locations consulted when an
//! identifier is resolved to an artifact. Order is significant: the first
//! repository that has the artifact wins.

use crate::error::{BuildError, BuildResult};
use serde::Serialize;
use std::fmt;
use trellis_config::RepositorySpec;

/// Scope a repository set applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepositoryScope {
    /// Plugin and classpath resolution for the build itself
    Buildscript,
    /// Dependency resolution for every project
    Project,
}

impl RepositoryScope {
    /// Get scope name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Buildscript => "buildscript",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for RepositoryScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A named artifact location
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Repository {
    /// Repository name
    pub name: String,
    /// Base URL, always ending in '/'
    pub url: String,
}

impl Repository {
    /// Create a repository, normalizing the URL to end with '/'
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        let mut url = url.into();
        if !url.ends_with('/') {
            url.push('/');
        }
        Self {
            name: name.into(),
            url,
        }
    }

    /// Google's Maven repository
    pub fn google() -> Self {
        Self::new("google", "https://dl.google.com/dl/android/maven2/")
    }

    /// Maven Central
    pub fn maven_central() -> Self {
        Self::new("maven-central", "https://repo.maven.apache.org/maven2/")
    }

    /// Gradle plugin portal
    pub fn gradle_plugin_portal() -> Self {
        Self::new("gradle-plugin-portal", "https://plugins.gradle.org/m2/")
    }

    /// The user's local Maven repository (~/.m2/repository)
    pub fn maven_local() -> BuildResult<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            BuildError::configuration("maven-local requires a home directory")
        })?;
        let path = home.join(".m2").join("repository");
        Ok(Self::new(
            "maven-local",
            format!("file://{}", path.to_string_lossy()),
        ))
    }

    /// Look up a well-known repository by its shorthand
    pub fn well_known(name: &str) -> BuildResult<Self> {
        match name {
            "google" => Ok(Self::google()),
            "maven-central" => Ok(Self::maven_central()),
            "gradle-plugin-portal" => Ok(Self::gradle_plugin_portal()),
            "maven-local" => Self::maven_local(),
            other => Err(BuildError::configuration(format!(
                "unknown repository '{}'",
                other
            ))),
        }
    }

    /// Build a repository from its declaration
    pub fn from_spec(spec: &RepositorySpec) -> BuildResult<Self> {
        match spec {
            RepositorySpec::Named(name) => Self::well_known(name),
            RepositorySpec::Custom { name, url } => {
                if name.trim().is_empty() || url.trim().is_empty() {
                    return Err(BuildError::configuration(
                        "custom repositories need a non-empty name and url",
                    ));
                }
                Ok(Self::new(name.as_str(), url.as_str()))
            }
        }
    }

    /// Location of a coordinate's POM inside this repository (Maven layout)
    pub fn artifact_url(&self, coordinate: &Coordinate) -> String {
        format!("{}{}", self.url, coordinate.pom_path())
    }
}

/// A `group:artifact:version` identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

impl Coordinate {
    /// Parse `group:artifact:version`
    pub fn parse(input: &str) -> BuildResult<Self> {
        let parts: Vec<&str> = input.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                Ok(Self {
                    group: group.to_string(),
                    artifact: artifact.to_string(),
                    version: version.to_string(),
                })
            }
            _ => Err(BuildError::configuration(format!(
                "invalid coordinate '{}', expected group:artifact:version",
                input
            ))),
        }
    }

    /// Relative path of the POM file in a Maven-layout repository
    pub fn pom_path(&self) -> String {
        format!(
            "{}/{}/{}/{}-{}.pom",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            self.artifact,
            self.version
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

/// Answers whether a repository holds an artifact
///
/// This is the seam to the artifact resolver; the layout manager never
/// fetches anything itself.
pub trait ArtifactSource {
    fn contains(&self, repository: &Repository, coordinate: &Coordinate) -> bool;
}

impl<F> ArtifactSource for F
where
    F: Fn(&Repository, &Coordinate) -> bool,
{
    fn contains(&self, repository: &Repository, coordinate: &Coordinate) -> bool {
        self(repository, coordinate)
    }
}

/// Ordered, duplicate-free list of repositories
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RepositorySet {
    repositories: Vec<Repository>,
}

impl RepositorySet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from declarations, keeping the first of any duplicates
    pub fn from_specs(specs: &[RepositorySpec]) -> BuildResult<Self> {
        let mut set = Self::new();
        for spec in specs {
            set.push(Repository::from_spec(spec)?);
        }
        Ok(set)
    }

    /// Append a repository. Returns false if it was already present.
    pub fn push(&mut self, repository: Repository) -> bool {
        if self.repositories.contains(&repository) {
            return false;
        }
        self.repositories.push(repository);
        true
    }

    /// Repositories in lookup order
    pub fn iter(&self) -> impl Iterator<Item = &Repository> {
        self.repositories.iter()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Candidate locations for a coordinate, in lookup order
    pub fn candidate_urls(&self, coordinate: &Coordinate) -> Vec<String> {
        self.repositories
            .iter()
            .map(|repo| repo.artifact_url(coordinate))
            .collect()
    }

    /// First repository that holds the coordinate
    pub fn locate<S: ArtifactSource + ?Sized>(
        &self,
        coordinate: &Coordinate,
        source: &S,
    ) -> Option<&Repository> {
        self.repositories
            .iter()
            .find(|repo| source.contains(repo, coordinate))
    }
}

impl IntoIterator for RepositorySet {
    type Item = Repository;
    type IntoIter = std::vec::IntoIter<Repository>;

    fn into_iter(self) -> Self::IntoIter {
        self.repositories.into_iter()
    }
}

impl FromIterator<Repository> for RepositorySet {
    fn from_iter<I: IntoIterator<Item = Repository>>(iter: I) -> Self {
        let mut set = Self::new();
        for repo in iter {
            set.push(repo);
        }
        set
    }
}
