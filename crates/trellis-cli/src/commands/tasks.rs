use super::{configure, Options};
use anyhow::Result;
use colored::Colorize;

/// List registered tasks
pub fn run(options: &Options) -> Result<()> {
    let resolved = configure(options)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(resolved.tasks())?);
        return Ok(());
    }

    let width = resolved
        .tasks()
        .iter()
        .map(|task| task.name.len())
        .max()
        .unwrap_or(0);
    for task in resolved.tasks() {
        let name = format!("{:width$}", task.name, width = width);
        println!("{}  {}", name.bold(), task.description);
    }
    Ok(())
}
