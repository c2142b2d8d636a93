mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_inspect, cmd_package};
use crate::output::OutputFormat;

/// assetpack - package application styles into distributable assets
#[derive(Parser)]
#[command(name = "assetpack")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Package styles and write them to an output directory
  Package {
    /// Path to the packager configuration (JSON)
    #[arg(short, long, default_value = "assetpack.json")]
    config: PathBuf,

    /// Directory holding app/styles, vendor fragments and addon-tree-output
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Directory the packaged files are written to
    #[arg(long, default_value = "dist")]
    out_dir: PathBuf,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the packaging graph without evaluating it
  Inspect {
    /// Path to the packager configuration (JSON)
    #[arg(short, long, default_value = "assetpack.json")]
    config: PathBuf,

    /// Directory holding app/styles, vendor fragments and addon-tree-output
    #[arg(short, long, default_value = ".")]
    input: PathBuf,

    /// Print the graph in Graphviz DOT format
    #[arg(long)]
    dot: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Package {
      config,
      input,
      out_dir,
      output,
    } => cmd_package(&config, &input, &out_dir, output),
    Commands::Inspect { config, input, dot } => cmd_inspect(&config, &input, dot),
  }
}
