//! ev-locate CLI entry point
//!
//! Geocoding, distance and location tools - CLI + web API

use ev_locate::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
