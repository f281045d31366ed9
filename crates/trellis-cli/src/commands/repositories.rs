use super::{configure, Options};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use trellis_build::{RepositoryScope, RepositorySet, ResolvedConfiguration};

#[derive(Serialize)]
struct ClasspathEntry {
    coordinate: String,
    candidates: Vec<String>,
}

#[derive(Serialize)]
struct RepositoriesOutput<'a> {
    buildscript: &'a RepositorySet,
    project: &'a RepositorySet,
    classpath: Vec<ClasspathEntry>,
}

/// Classpath coordinates with every location tried, in lookup order
fn classpath_entries(resolved: &ResolvedConfiguration) -> Vec<ClasspathEntry> {
    let buildscript = resolved.repositories(RepositoryScope::Buildscript);
    resolved
        .classpath()
        .iter()
        .map(|coordinate| ClasspathEntry {
            coordinate: coordinate.to_string(),
            candidates: buildscript.candidate_urls(coordinate),
        })
        .collect()
}

/// Print both repository scopes and the classpath lookup locations
pub fn run(options: &Options) -> Result<()> {
    let resolved = configure(options)?;
    let classpath = classpath_entries(&resolved);

    if options.json {
        let output = RepositoriesOutput {
            buildscript: resolved.repositories(RepositoryScope::Buildscript),
            project: resolved.repositories(RepositoryScope::Project),
            classpath,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for scope in [RepositoryScope::Buildscript, RepositoryScope::Project] {
        println!("{}", format!("{} repositories:", scope).bold());
        let set = resolved.repositories(scope);
        if set.is_empty() {
            println!("  {}", "(none)".dimmed());
        }
        for (index, repo) in set.iter().enumerate() {
            println!("  {}. {} {}", index + 1, repo.name, repo.url.dimmed());
        }
    }

    if !classpath.is_empty() {
        println!("{}", "Classpath:".bold());
        for entry in &classpath {
            println!("  {}", entry.coordinate);
            for candidate in &entry.candidates {
                println!("    {}", candidate.dimmed());
            }
        }
    }

    Ok(())
}
