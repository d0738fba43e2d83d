//! Command line front end for the `harvester` library.
//!
//! Pulls publications, institutions and concepts out of the OpenAlex catalog and writes them
//! to stdout as JSON lines, one record per line. Progress and summaries go to stderr, so the
//! output can be piped straight into `jq` or a file.
//!
//! # Usage
//!
//! ```bash
//! # 50 publications from Harvard, with the default columns
//! harvester institution "Harvard University" --cap 50
//!
//! # Publications from French institutions, choosing columns
//! harvester country FR --cap 500 -c Title -c "Cited by Count" -c Venue
//!
//! # Publications tagged with a concept
//! harvester field C41008148 --cap 100
//!
//! # Browse the taxonomy
//! harvester concepts --level 1 --parent C41008148
//!
//! # Everything a harvest can export
//! harvester columns
//! ```
//!
//! Pressing Ctrl-C during a harvest stops it after the page in flight; the rows gathered so far
//! are still written. Logging detail grows with each `-v`, and `RUST_LOG` overrides it.

#![warn(missing_docs, clippy::missing_docs_in_private_items)]

use std::{path::PathBuf, process::ExitCode};

use clap::{builder::ArgAction, Args, Parser, Subcommand};
use harvester::{config::Config, error::HarvesterError, prelude::*, Harvester};
use serde::Serialize;
use tracing::{debug, trace};
use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod error;
pub mod interaction;

use crate::{commands::*, error::*, interaction::*};

/// Command line interface configuration and argument parsing
#[derive(Parser, Debug)]
#[command(author, version, about = "Bulk retrieval of scholarly metadata from OpenAlex")]
pub struct Cli {
  /// Verbose mode (-v, -vv, -vvv) for different levels of logging detail
  #[arg(
        short,
        long,
        action = ArgAction::Count,
        global = true,
        help = "Increase logging verbosity"
    )]
  verbose: u8,

  /// Path to a configuration file. If not specified, uses the default platform-specific
  /// configuration directory when a file exists there.
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// The subcommand to execute
  #[command(subcommand)]
  command: Commands,
}

/// Configures the logging system based on the verbosity level
///
/// # Arguments
///
/// * `verbosity` - Number of times the verbose flag was used
///
/// The verbosity levels are:
/// - 0: error (default)
/// - 1: warn
/// - 2: info
/// - 3: debug
/// - 4+: trace
fn setup_logging(verbosity: u8) {
  let filter = match verbosity {
    0 => "error",
    1 => "warn",
    2 => "info",
    3 => "debug",
    _ => "trace",
  };

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_file(true)
    .with_line_number(true)
    .with_thread_ids(true)
    .with_target(true)
    .init();
}

/// Reads the configuration named on the command line, or the default one.
fn load_config(path: Option<&PathBuf>) -> Result<Config> {
  let config = match path {
    Some(path) => Config::load(path)?,
    None => Config::load_or_default()?,
  };
  debug!("Using configuration {config:?}");
  Ok(config)
}

/// A token that fires on the first Ctrl-C.
fn cancel_on_interrupt() -> CancellationToken {
  let cancel = CancellationToken::new();
  let on_interrupt = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      debug!("Interrupt received, stopping after the current page");
      on_interrupt.cancel();
    }
  });
  cancel
}

/// Runs the parsed command.
async fn run(cli: Cli, interaction: &Terminal) -> Result<()> {
  if let Commands::Columns = cli.command {
    return columns(interaction);
  }

  let config = load_config(cli.config.as_ref())?;
  let harvester = Harvester::openalex(config)?;
  let cancel = cancel_on_interrupt();

  match cli.command {
    Commands::Institution(options) => harvest(interaction, &harvester, Scope::Institution, options, cancel).await,
    Commands::Country(options) => harvest(interaction, &harvester, Scope::Country, options, cancel).await,
    Commands::Field(options) => harvest(interaction, &harvester, Scope::Field, options, cancel).await,
    Commands::Concepts(options) => concepts(interaction, &harvester, options).await,
    Commands::ConceptCounts => concept_counts(interaction, &harvester).await,
    Commands::Countries => countries(interaction, &harvester).await,
    Commands::Institutions { country } => institutions(interaction, &harvester, &country, cancel).await,
    Commands::Columns => columns(interaction),
  }
}

/// Entry point for the harvester CLI application
///
/// Handles command line argument parsing, sets up logging, and executes the requested
/// command. A failure is reported once on stderr and the process exits with status 1 when:
/// - A requested column does not exist
/// - An institution name cannot be resolved
/// - The configuration file cannot be read
/// - Output cannot be written
#[tokio::main]
async fn main() -> ExitCode {
  let cli = Cli::parse();
  setup_logging(cli.verbose);
  trace!("Parsed arguments: {cli:?}");

  let interaction = Terminal;
  match run(cli, &interaction).await {
    Ok(()) => ExitCode::SUCCESS,
    Err(error) => {
      if interaction.reply(ResponseContent::Error(&error)).is_err() {
        eprintln!("{error}");
      }
      ExitCode::FAILURE
    },
  }
}
