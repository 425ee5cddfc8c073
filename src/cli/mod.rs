//! CLI command handlers
//!
//! Each subcommand has its own module with handler functions.

pub mod cache;
pub mod config;
pub mod distance;
pub mod geocode;
pub mod locate;
pub mod nearest;
pub mod serve;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Geocoding, distance and location tools for the EV service platform
#[derive(Parser)]
#[command(name = "ev-locate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve an address to coordinates
    Geocode(geocode::GeocodeArgs),

    /// Great-circle distance between two coordinates
    Distance(distance::DistanceArgs),

    /// List places nearest first from an origin
    Nearest(nearest::NearestArgs),

    /// Find the current location (device, then IP)
    Locate(locate::LocateArgs),

    /// Inspect or maintain the geocode cache
    Cache(cache::CacheArgs),

    /// Manage configuration
    Config(config::ConfigArgs),

    /// Start web server (foreground)
    Serve(serve::ServeArgs),
}

/// Initialize logging to stderr, honouring RUST_LOG
fn init_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();
}

/// Run the CLI
pub async fn run() -> crate::error::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve(_) => "info",
        _ => "warn",
    };
    init_logging(default_level);

    match cli.command {
        Commands::Geocode(args) => geocode::run(args).await,
        Commands::Distance(args) => distance::run(args),
        Commands::Nearest(args) => nearest::run(args),
        Commands::Locate(args) => locate::run(args).await,
        Commands::Cache(args) => cache::run(args),
        Commands::Config(args) => config::run(args),
        Commands::Serve(args) => serve::run(args).await,
    }
}
