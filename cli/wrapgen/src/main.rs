//! wrapgen CLI: generates raw FFI declarations and safe wrappers from
//! declarative catalogs.

mod commands;
mod manifest;

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use manifest::WrapgenManifest;

#[derive(Parser)]
#[command(name = "wrapgen", version, about = "Declarative FFI binding generator")]
struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Log errors only
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a wrapgen.toml and starter catalogs
    Init {
        /// Project directory (default: current directory)
        path: Option<String>,
    },
    /// Generate one source unit per variant
    Generate {
        /// Compare with the files on disk instead of writing them
        #[arg(long)]
        check: bool,
    },
    /// Check byte-length constants against reference C headers
    CheckConstants {
        /// Reference tree root (default: [check] extern_dir)
        #[arg(long)]
        extern_dir: Option<String>,
    },
    /// Emit the cfg-gated module index
    Modules {
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

/// Initialise `env_logger`; `WRAPGEN_LOG` overrides the flag-derived level.
fn setup_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let env = env_logger::Env::default().filter_or("WRAPGEN_LOG", level);
    env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_module_path(verbose)
        .init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;

    match cli.command {
        Commands::Init { path } => {
            let project_dir = path.map(|p| cwd.join(p)).unwrap_or(cwd);
            commands::init::run(&project_dir)
        }

        Commands::Generate { check } => {
            let (manifest, project_dir) = load_manifest_required(&cwd)?;
            commands::generate::run(&project_dir, &manifest, check)
        }

        Commands::CheckConstants { extern_dir } => {
            let (manifest, project_dir) = load_manifest_required(&cwd)?;
            commands::check::run(&project_dir, &manifest, extern_dir.as_deref())
        }

        Commands::Modules { output } => {
            let (manifest, project_dir) = load_manifest_required(&cwd)?;
            commands::modules::run(&project_dir, &manifest, output.as_deref())
        }
    }
}

/// Load manifest, returning error if not found.
fn load_manifest_required(cwd: &Path) -> anyhow::Result<(WrapgenManifest, PathBuf)> {
    match WrapgenManifest::find_and_load(cwd)? {
        Some((manifest, dir)) => Ok((manifest, dir)),
        None => anyhow::bail!("no {} found (run `wrapgen init` first)", manifest::MANIFEST_NAME),
    }
}
