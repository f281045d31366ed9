use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use trellis_build::CLEAN_TASK;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

/// Trellis multi-project build layout orchestrator.
///
/// Reads trellis.toml, configures artifact repositories, assigns every
/// subproject an output directory under the shared root output directory,
/// orders project evaluation and runs the resulting tasks.
///
/// EXAMPLES:
///     trellis projects              Show output directories and evaluation order
///     trellis repos                 Show repositories in lookup order
///     trellis clean                 Delete the root output directory
///     trellis -C android clean      Clean a project in another directory
///
/// ENVIRONMENT VARIABLES:
///     TRELLIS_BUILD_DIR   Override the root output directory
///     TRELLIS_JSON        Set to '1' for JSON output by default
///     NO_COLOR            Set to disable colored output
///     RUST_LOG            Log filter (e.g. trellis_build=debug)
#[derive(Parser)]
#[command(name = "trellis")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, short = 'C', global = true, value_name = "DIR")]
    project_dir: Option<PathBuf>,

    /// Root output directory, overriding trellis.toml
    #[arg(long, global = true, value_name = "DIR")]
    build_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true, env = "TRELLIS_JSON")]
    json: bool,

    /// Verbose output (debug logging)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete the root output directory
    ///
    /// A missing output directory is not an error.
    Clean,

    /// Run a registered task by name
    ///
    /// EXAMPLES:
    ///     trellis run clean
    Run {
        /// Task name
        task: String,
    },

    /// List registered tasks
    Tasks,

    /// Show subproject output directories and evaluation order
    Projects,

    /// Show repositories and classpath lookup locations
    #[command(visible_alias = "repos")]
    Repositories,

    /// Generate shell completions
    ///
    /// EXAMPLES:
    ///     trellis completions bash > ~/.local/share/bash-completion/completions/trellis
    ///     trellis completions zsh > ~/.zfunc/_trellis
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Install the log subscriber; `RUST_LOG` wins over `--verbose`
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cli_config = config::Config::from_env();
    if cli_config.no_color {
        colored::control::set_override(false);
    }

    let options = commands::Options {
        project_dir: cli.project_dir.unwrap_or_else(|| PathBuf::from(".")),
        build_dir: cli.build_dir,
        json: cli.json,
    };

    match cli.command {
        Commands::Clean => commands::run::run(&options, CLEAN_TASK),
        Commands::Run { task } => commands::run::run(&options, &task),
        Commands::Tasks => commands::tasks::run(&options),
        Commands::Projects => commands::projects::run(&options),
        Commands::Repositories => commands::repositories::run(&options),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}
