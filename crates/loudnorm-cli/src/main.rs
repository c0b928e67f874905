//! Loudnorm CLI - plan, simulate and render loudness normalization.

mod commands;
mod wav;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "loudnorm")]
#[command(author, version, about = "Loudness normalization toolkit", long_about = None)]
struct Cli {
    /// Log filter (e.g. "debug", "loudnorm_control=debug"); overrides RUST_LOG
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    /// Settings file (defaults to the user config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what the normalizer would do for a loudness value
    Plan(commands::plan::PlanArgs),

    /// Run the controller against a scripted in-memory host
    Simulate(commands::simulate::SimulateArgs),

    /// Render a WAV file through the normalization pipeline
    Process(commands::process::ProcessArgs),

    /// Show the effective settings
    Config(commands::config::ConfigArgs),
}

fn init_tracing(log_level: Option<&str>) {
    let filter = match log_level {
        Some(directives) => EnvFilter::new(directives),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    };
    // Diagnostics go to stderr so command output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let config = cli.config.as_deref();
    match cli.command {
        Commands::Plan(args) => commands::plan::run(args, config),
        Commands::Simulate(args) => commands::simulate::run(args, config),
        Commands::Process(args) => commands::process::run(args, config),
        Commands::Config(args) => commands::config::run(args, config),
    }
}
