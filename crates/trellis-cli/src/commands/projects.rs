//! Projects command - show the resolved output layout and evaluation order

use super::{configure, Options};
use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use trellis_build::ResolvedConfiguration;

#[derive(Serialize)]
struct ProjectsOutput<'a> {
    root_project: &'a str,
    root_output_directory: &'a Path,
    bindings: BTreeMap<&'a str, &'a Path>,
    evaluation_order: &'a [String],
    evaluation_waves: &'a [Vec<String>],
}

impl<'a> From<&'a ResolvedConfiguration> for ProjectsOutput<'a> {
    fn from(resolved: &'a ResolvedConfiguration) -> Self {
        Self {
            root_project: resolved.root_project(),
            root_output_directory: resolved.root_output_directory(),
            bindings: resolved.binding_map(),
            evaluation_order: resolved.evaluation_order(),
            evaluation_waves: resolved.evaluation_waves(),
        }
    }
}

/// Print the root output directory, bindings and evaluation order
pub fn run(options: &Options) -> Result<()> {
    let resolved = configure(options)?;

    if options.json {
        let output = ProjectsOutput::from(&resolved);
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{} {}", "Root project:".bold(), resolved.root_project());
    println!(
        "{} {}",
        "Output directory:".bold(),
        resolved.root_output_directory().display()
    );

    if resolved.bindings().is_empty() {
        println!("{}", "No subprojects".dimmed());
    } else {
        println!("{}", "Subprojects:".bold());
        let width = resolved
            .bindings()
            .iter()
            .map(|b| b.project.len())
            .max()
            .unwrap_or(0);
        for binding in resolved.bindings() {
            println!(
                "  {:width$}  -> {}",
                binding.project,
                binding.output_directory.display(),
                width = width
            );
        }
    }

    println!(
        "{} {}",
        "Evaluation order:".bold(),
        resolved.evaluation_order().join(", ")
    );
    for (index, wave) in resolved.evaluation_waves().iter().enumerate() {
        println!("  wave {}: {}", index + 1, wave.join(", "));
    }

    Ok(())
}
