mod console;
mod repl;
mod tokenize;

use anyhow::{Context, Result};
use clap::Parser;
use console::Console;
use repl::Repl;
use scribe::{EventBus, Logger, StateKeeper, Workspace};
use scribe_spell::{Dictionary, SpellChecker};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(about = "Edit text and XML files from an interactive command shell")]
struct Cli {
    /// Directory that relative paths and the workspace state file live in
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Start with no files open instead of reopening the last session
    #[arg(long)]
    no_restore: bool,

    /// Print diagnostics to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let base_dir = std::path::absolute(&cli.base_dir)
        .with_context(|| format!("Failed to resolve {:?}", cli.base_dir))?;

    let console = Console::stdio();
    let bus = Arc::new(EventBus::new());
    let logger = Arc::new(Logger::new());
    bus.subscribe(logger.clone());

    let mut workspace = Workspace::new(&base_dir, bus, StateKeeper::new(&base_dir), logger)
        .with_decider(Box::new(console.clone()))
        .with_spell_service(Box::new(SpellChecker::new(Dictionary::default())));

    if !cli.no_restore {
        workspace
            .restore()
            .with_context(|| format!("Failed to restore workspace in {:?}", base_dir))?;
    }

    Repl::new(workspace, console).run()
}

/// Diagnostics go to stderr so they never interleave with command output.
/// `SCRIBE_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SCRIBE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("scribe={level},scribe_cli={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
