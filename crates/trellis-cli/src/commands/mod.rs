pub mod projects;
pub mod repositories;
pub mod run;
pub mod tasks;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use trellis_build::{ConfigurationContext, ResolvedConfiguration};
use trellis_config::ConfigLoader;

/// Flags shared by every command
pub struct Options {
    /// Directory to start the trellis.toml search from
    pub project_dir: PathBuf,
    /// Root output directory override (--build-dir)
    pub build_dir: Option<PathBuf>,
    /// JSON output
    pub json: bool,
}

/// Load configuration, apply CLI overrides and run the configuration phase
pub fn configure(options: &Options) -> Result<ResolvedConfiguration> {
    let mut loader = ConfigLoader::new();
    let mut config = loader
        .load_from_directory(&options.project_dir)
        .with_context(|| {
            format!(
                "Failed to load configuration from {}",
                options.project_dir.display()
            )
        })?;

    if let Some(build_dir) = &options.build_dir {
        config.project.set_build_dir(build_dir.clone());
    }

    let project_root = config
        .project_root()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| options.project_dir.clone());
    debug!(
        root = %project_root.display(),
        manifest = config.is_project(),
        "configuring project"
    );

    let context =
        ConfigurationContext::from_config(project_root, &config).context("Configuration failed")?;
    let resolved = context.resolve().context("Configuration failed")?;
    Ok(resolved)
}
