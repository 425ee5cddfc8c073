//! Locate command handler
//!
//! Finds the current location: configured device first, then IP.
//! Ctrl-C cancels the pending lookup.

use crate::config::Config;
use crate::error::{Error, Result};
use crate::geo::location::LocationSource;
use crate::geo::GeoService;
use clap::Args;

/// Locate command arguments
#[derive(Args)]
pub struct LocateArgs {
    /// Skip the device and use IP geolocation only
    #[arg(long)]
    pub no_device: bool,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

/// Run the locate command
pub async fn run(args: LocateArgs) -> Result<()> {
    let mut config = Config::load()?;
    if args.no_device {
        config.location.use_device = false;
    }

    let service = GeoService::from_config(&config)?;
    let task = service.spawn_locate();

    let location = tokio::select! {
        location = task.join() => location,
        _ = tokio::signal::ctrl_c() => {
            return Err(Error::Geo("Location lookup cancelled".to_string()));
        }
    };

    let location = location.ok_or_else(|| Error::Geo("Location unavailable".to_string()))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&location)?);
    } else {
        let source = match location.source {
            LocationSource::Device => "device",
            LocationSource::Ip => "IP",
        };
        println!("{} (via {})", location.coords, source);
    }

    Ok(())
}
