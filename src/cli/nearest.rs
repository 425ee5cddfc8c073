//! Nearest command handler
//!
//! Lists places nearest first from an origin point.

use crate::cli::geocode::parse_point;
use crate::coord::distance::{rank_by_distance, NamedPlace};
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use clap::Args;

/// Nearest command arguments
#[derive(Args)]
pub struct NearestArgs {
    /// Origin point ("lat,lng")
    #[arg(value_parser = parse_point, allow_hyphen_values = true)]
    pub origin: Coordinates,

    /// Candidate place ("name=lat,lng"), repeatable
    #[arg(long = "place", short = 'p', value_parser = parse_place, allow_hyphen_values = true)]
    pub places: Vec<NamedPlace>,

    /// Show only the first N places
    #[arg(long, short = 'l')]
    pub limit: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Parse "name=lat,lng" into a named place
pub fn parse_place(s: &str) -> std::result::Result<NamedPlace, String> {
    let (name, point) = s
        .rsplit_once('=')
        .ok_or_else(|| format!("expected \"name=lat,lng\", got \"{}\"", s))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing place name in \"{}\"", s));
    }
    Ok(NamedPlace {
        name: name.to_string(),
        coords: parse_point(point)?,
    })
}

/// Run the nearest command
pub fn run(args: NearestArgs) -> Result<()> {
    if args.places.is_empty() {
        return Err(Error::Config("No places given (use --place name=lat,lng)".to_string()));
    }

    let mut ranked = rank_by_distance(args.origin, args.places);
    if let Some(limit) = args.limit {
        ranked.truncate(limit);
    }

    if args.json {
        let rows: Vec<serde_json::Value> = ranked
            .iter()
            .map(|(place, km)| {
                serde_json::json!({
                    "name": place.name,
                    "lat": place.coords.lat,
                    "lng": place.coords.lng,
                    "km": km,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for (place, km) in &ranked {
            println!("{:>10.3} km  {}  ({})", km, place.name, place.coords);
        }
    }

    Ok(())
}
