//! moar CLI - host simulator and EEPROM image tool for the moar controller.

mod commands;
mod scenario;
mod storage;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "moar")]
#[command(author, version, about = "moar MIDI controller host tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario through the controller on a simulated board
    Simulate(commands::simulate::SimulateArgs),

    /// Create, inspect and damage EEPROM images
    Image(commands::image::ImageArgs),
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate(args) => commands::simulate::run(args),
        Commands::Image(args) => commands::image::run(args),
    }
}
