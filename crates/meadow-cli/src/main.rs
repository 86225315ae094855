//! Headless command-line driver for the Meadow simulation.

mod commands;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "meadow",
    about = "Meadow - a tile-based life simulation",
    version,
    propagate_version = true
)]
struct Cli {
    /// Log lifecycle events (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation headless and print a summary
    Simulate {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: PathBuf,

        /// Start from a save file instead of generating a world
        #[arg(short, long)]
        load: Option<PathBuf>,

        /// Real seconds of frame time to simulate
        #[arg(long, default_value = "60")]
        seconds: u64,

        /// Frames per real second
        #[arg(long, default_value = "10")]
        fps: u32,

        /// Simulated seconds per real second
        #[arg(long, default_value = "1.0")]
        speed: f32,

        /// RNG seed for world generation
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// World width in tiles
        #[arg(long, default_value = "16")]
        width: u32,

        /// World height in tiles
        #[arg(long, default_value = "16")]
        height: u32,

        /// Spawn a creature before the first frame, as TEMPLATE@X,Y
        #[arg(long = "creature", value_name = "ID@X,Y")]
        creatures: Vec<String>,

        /// Write the final world to this file
        #[arg(long)]
        save: Option<PathBuf>,
    },

    /// Summarize a save file
    Inspect {
        /// Save file to read
        save: PathBuf,
    },

    /// Validate a catalog file
    CheckCatalog {
        /// Catalog JSON file
        catalog: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Simulate {
            catalog,
            load,
            seconds,
            fps,
            speed,
            seed,
            width,
            height,
            creatures,
            save,
        } => commands::simulate::run(&commands::simulate::SimulateArgs {
            catalog,
            load,
            seconds,
            fps,
            speed,
            seed,
            width,
            height,
            creatures,
            save,
        }),
        Commands::Inspect { save } => commands::inspect::run(&save),
        Commands::CheckCatalog { catalog } => commands::check_catalog::run(&catalog),
    };

    if let Err(e) = result {
        eprintln!("{} {e}", "error:".red().bold());
        process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}
