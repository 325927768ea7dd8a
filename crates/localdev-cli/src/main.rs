use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod completion;
mod dispatch;
mod render;

use dispatch::run_cli;

const LOG_FILTER_ENV: &str = "LOCALDEV_LOG";

#[derive(Parser, Debug)]
#[command(name = "localdev")]
#[command(
    about = "Switch plugins and themes between VCS and local development copies",
    long_about = None
)]
struct Cli {
    /// Site root holding the plugins, themes and state directories.
    #[arg(long, global = true)]
    site_root: Option<PathBuf>,
    /// Raise log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the effective variant of every pair.
    Status,
    /// List base identifiers that have both variants installed.
    Pairs { category: String },
    /// List installed units with the inactive twin of each pair hidden.
    List {
        category: String,
        #[arg(long)]
        all: bool,
    },
    /// Switch a pair to its other variant.
    Toggle { category: String, base: String },
    /// Rewrite active entries so every pair points at its effective variant.
    Reconcile,
    Activate { category: String, id: String },
    Deactivate { id: String },
    Doctor,
    Completion {
        #[arg(value_enum)]
        shell: CliCompletionShell,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliCompletionShell {
    Bash,
    Zsh,
    Fish,
    Powershell,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = run_cli(cli)?;
    if code == 0 {
        Ok(())
    } else {
        std::process::exit(code);
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_log_filter(verbose)));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn default_log_filter(verbose: u8) -> String {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    format!("localdev_core={level},localdev_store={level},localdev={level}")
}

#[cfg(test)]
mod tests;
