//! Run command - execute a registered task after configuration

use super::{configure, Options};
use anyhow::{Context, Result};
use colored::Colorize;
use trellis_build::{CleanOutcome, TaskReport};

/// Configure the project and run `task`
pub fn run(options: &Options, task: &str) -> Result<()> {
    let resolved = configure(options)?;
    let report = resolved
        .run_task(task)
        .with_context(|| format!("Task '{}' failed", task))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &TaskReport) {
    for target in &report.targets {
        match target.outcome {
            CleanOutcome::Removed => {
                println!("{} {}", "Removed".green().bold(), target.path.display())
            }
            CleanOutcome::AlreadyAbsent => println!(
                "{} {} (nothing to delete)",
                "Skipped".yellow().bold(),
                target.path.display()
            ),
        }
    }
    println!("{} {}", "Finished".green().bold(), report.task);
}
