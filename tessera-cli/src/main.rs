//! Tessera CLI - Command-line interface
//!
//! Drives the tessera library end to end: tiling images through the shared
//! cache, painting multi-resolution candidates, and inspecting configuration.

mod commands;
mod error;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use tracing::debug;

use commands::common::load_config;
use commands::config::ConfigCommands;
use commands::font::FontArgs;
use commands::render::RenderArgs;
use commands::tiles::TilesArgs;
use error::CliError;

#[derive(Debug, Parser)]
#[command(
    name = "tessera",
    version,
    about = "Tiled raster caching and multi-resolution image rendering"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Also write log events to this file
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Tile an image through the shared cache and reassemble it
    Tiles(TilesArgs),

    /// Paint the best-fit candidate of a multi-resolution image
    Render(RenderArgs),

    /// Resolve font families through the configured table
    Font(FontArgs),

    /// View or modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match tessera::logging::init(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    debug!(version = tessera::VERSION, "Starting tessera");

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Tiles(args) => commands::tiles::run(args, &load_config(config_path)?),
        Commands::Render(args) => commands::render::run(args, &load_config(config_path)?),
        Commands::Font(args) => commands::font::run(args, &load_config(config_path)?),
        Commands::Config(command) => commands::config::run(command, config_path),
    }
}
