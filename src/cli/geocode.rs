//! Geocode command handler
//!
//! Resolves an address (and optional place name) to coordinates.

use crate::config::Config;
use crate::coord::distance::haversine_km;
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use crate::geo::GeoService;
use clap::Args;
use serde::Serialize;

/// Geocode command arguments
#[derive(Args)]
pub struct GeocodeArgs {
    /// Address to resolve
    #[arg(default_value = "")]
    pub address: String,

    /// Place or business name to help the search
    #[arg(long, short = 'n', default_value = "")]
    pub name: String,

    /// Don't read or write the on-disk cache
    #[arg(long)]
    pub no_cache: bool,

    /// Also print the distance from this point ("lat,lng")
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub from: Option<Coordinates>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct GeocodeOutput<'a> {
    address: &'a str,
    name: &'a str,
    lat: f64,
    lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_km: Option<f64>,
}

/// Parse "lat,lng" into validated coordinates
pub fn parse_point(s: &str) -> std::result::Result<Coordinates, String> {
    let (lat, lng) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got \"{}\"", s))?;
    let lat: f64 = lat.trim().parse().map_err(|_| format!("invalid latitude: {}", lat))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("invalid longitude: {}", lng))?;
    Coordinates::checked(lat, lng).map_err(|e| e.to_string())
}

/// Run the geocode command
pub async fn run(args: GeocodeArgs) -> Result<()> {
    let mut config = Config::load()?;
    if args.no_cache {
        config.cache.enabled = false;
    }

    let service = GeoService::from_config(&config)?;

    let coords = service
        .geocode(&args.address, &args.name)
        .await
        .ok_or_else(|| {
            Error::Geocoding(format!(
                "No result for address \"{}\" name \"{}\"",
                args.address, args.name
            ))
        })?;

    let distance_km = args.from.map(|from| haversine_km(from, coords));

    if args.json {
        let output = GeocodeOutput {
            address: &args.address,
            name: &args.name,
            lat: coords.lat,
            lng: coords.lng,
            distance_km,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", coords);
        if let Some(km) = distance_km {
            println!("{:.3} km away", km);
        }
    }

    Ok(())
}
