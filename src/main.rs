// Syncer
// Command-line entry point: track, check and remind

// IMPORTS ------------------>>

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use syncer::core::{App, AppConfig};
use syncer::errors::SyncerError;
use syncer::ui::{render_remind, render_summary, TerminalPrompt};

//--------------------------------------------------------<<
// CLI DEFINITION ----------->>

#[derive(Parser)]
#[command(name = "syncer", version, about = "Keep copies of shared files in sync across repos")]
struct Cli {
    /// Store file (defaults to $SYNCER_STORE, then ~/.syncer)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Track the current directory under a repo name, or two files as a pair
    Track {
        /// <repo-name> or <file1> <file2>
        #[arg(required = true, num_args = 1..=2, value_name = "TARGET")]
        targets: Vec<String>,
    },
    /// Compare every tracked pair and resolve differences interactively
    Check,
    /// Print the files overwritten by the last check
    Remind,
}

//--------------------------------------------------------<<

// ┌──────────────────────────────────────────────────────────────────────────────────────────────────────────────────┐
// │                                                 MAIN ENTRY POINT                                                 │
// └──────────────────────────────────────────────────────────────────────────────────────────────────────────────────┘

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if matches!(e.downcast_ref::<SyncerError>(), Some(SyncerError::Interrupted)) => {
            println!();
            println!("Interrupted; store left unchanged.");
            ExitCode::from(130)
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("SYNCER_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::default();
    let store_path = config.store_path(cli.store)?;
    let mut app = App::open(config, store_path)?;

    match cli.command {
        Commands::Track { targets } => cmd_track(&mut app, &targets),
        Commands::Check => cmd_check(&mut app),
        Commands::Remind => cmd_remind(&app),
    }
}

// ┌──────────────────────────────────────────────────────────────────────────────────────────────────────────────────┐
// │                                                  COMMAND HANDLERS                                                │
// └──────────────────────────────────────────────────────────────────────────────────────────────────────────────────┘

fn cmd_track(app: &mut App, targets: &[String]) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;

    match targets {
        [name] => {
            let added = app.track_repo(name, &cwd)?;
            app.persist()?;
            if added {
                println!("Started tracking {} as {}", cwd.display(), name);
            } else {
                println!("Already tracking {} as {}", cwd.display(), name);
            }
        }
        [a, b] => {
            let added = app.track_files(&cwd, Path::new(a), Path::new(b))?;
            app.persist()?;
            if added {
                println!("Started tracking {} <> {}", a, b);
            } else {
                println!("Already tracking {} <> {}", a, b);
            }
        }
        _ => bail!("track takes a repo name or two file paths"),
    }
    Ok(())
}

fn cmd_check(app: &mut App) -> Result<()> {
    let stdout = io::stdout();
    let mut prompt = TerminalPrompt::new(stdout.lock());
    let summary = app.check(&mut prompt)?;
    drop(prompt);

    // Persisted even when nothing was overwritten, replacing the prior ledger
    app.persist()?;

    let mut out = io::stdout().lock();
    render_summary(&mut out, &summary)?;
    out.flush()?;
    Ok(())
}

fn cmd_remind(app: &App) -> Result<()> {
    let mut out = io::stdout().lock();
    render_remind(&mut out, app.remind())?;
    out.flush()?;
    Ok(())
}
