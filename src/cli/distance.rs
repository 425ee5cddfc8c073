//! Distance command handler

use crate::coord::distance::haversine_km;
use crate::coord::Coordinates;
use crate::error::Result;
use clap::Args;

/// Distance command arguments
#[derive(Args)]
pub struct DistanceArgs {
    /// Latitude of the first point
    #[arg(allow_negative_numbers = true)]
    pub lat1: f64,
    /// Longitude of the first point
    #[arg(allow_negative_numbers = true)]
    pub lng1: f64,
    /// Latitude of the second point
    #[arg(allow_negative_numbers = true)]
    pub lat2: f64,
    /// Longitude of the second point
    #[arg(allow_negative_numbers = true)]
    pub lng2: f64,
}

/// Run the distance command
pub fn run(args: DistanceArgs) -> Result<()> {
    let from = Coordinates::checked(args.lat1, args.lng1)?;
    let to = Coordinates::checked(args.lat2, args.lng2)?;

    println!("{:.3} km", haversine_km(from, to));
    Ok(())
}
