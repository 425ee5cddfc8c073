//! Server shared state
//!
//! Holds configuration and the geo service shared by all handlers.

use crate::config::Config;
use crate::error::Result;
use crate::geo::GeoService;
use std::time::Instant;

/// Shared state for the HTTP server
#[derive(Debug)]
pub struct AppState {
    /// Configuration the service was built from
    pub config: Config,

    /// Geocoder, locator and cache
    pub service: GeoService,

    started: Instant,
}

impl AppState {
    /// Build state from configuration
    pub fn new(config: Config) -> Result<Self> {
        let service = GeoService::from_config(&config)?;
        Ok(Self::with_service(config, service))
    }

    /// Build state around an already constructed service
    pub fn with_service(config: Config, service: GeoService) -> Self {
        Self {
            config,
            service,
            started: Instant::now(),
        }
    }

    /// Seconds since the state was created
    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
