//! ev-locate: geocoding and location for the EV service platform
//!
//! A library and CLI tool that places customers and service centers on the
//! map.
//!
//! ## Features
//!
//! - Address geocoding through Nominatim, restricted to one country
//! - Persistent geocode cache with a 7-day TTL
//! - Rate-limited, sequential query variants on cache misses
//! - Haversine distance and nearest-first ranking
//! - Current location from the device with IP geolocation fallback
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust
//! use ev_locate::coord::distance::haversine_km;
//! use ev_locate::Coordinates;
//!
//! let hanoi = Coordinates::new(21.0285, 105.8542);
//! let saigon = Coordinates::new(10.7769, 106.7009);
//!
//! let km = haversine_km(hanoi, saigon);
//! println!("Hanoi to Saigon: {:.0} km", km);
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod coord;
pub mod error;
pub mod geo;
pub mod server;

// Re-export commonly used types
pub use config::Config;
pub use coord::Coordinates;
pub use error::{Error, Result};
pub use geo::location::{LocationSource, ResolvedLocation};
pub use geo::GeoService;
