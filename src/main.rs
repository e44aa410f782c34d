//! memdb CLI
//!
//! Evaluates a script file, or statements typed on stdin.

use std::{io, path::PathBuf};

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use memdb::{Engine, driver};

/// In-memory SQL-dialect engine.
#[derive(Parser)]
#[command(name = "memdb")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script to evaluate; statements are read from stdin when omitted.
    file: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut engine = Engine::new();
    match cli.file {
        Some(path) => print!("{}", driver::run_file(&mut engine, path)?),
        None => driver::run_lines(&mut engine, io::stdin().lock(), io::stdout().lock())?,
    }
    Ok(())
}
