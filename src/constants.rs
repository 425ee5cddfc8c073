//! Centralized constants for the ev-locate crate
//!
//! Values shared by the geocoder, the cache and the location resolver.

/// Geographic constants
pub mod geo {
    /// Mean Earth radius in kilometers
    pub const EARTH_RADIUS_KM: f64 = 6371.0;
}

/// External API endpoints
pub mod api {
    /// OpenStreetMap Nominatim geocoding API
    pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

    /// IP geolocation API (free, no key required, returns latitude/longitude)
    pub const IP_API_URL: &str = "https://ipapi.co/json/";

    /// User-Agent sent to Nominatim (required by its usage policy)
    pub const USER_AGENT: &str = concat!("ev-locate/", env!("CARGO_PKG_VERSION"));
}

/// Geocode cache settings
pub mod cache {
    /// Storage key holding the serialized cache map
    pub const GEOCODE_CACHE_KEY: &str = "ev-locate.geocode-cache.v1";

    /// Cache entry lifetime in days
    pub const GEOCODE_TTL_DAYS: u64 = 7;

    /// Milliseconds in one day
    pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

    /// Separator between the address and name hint parts of a cache key
    pub const KEY_SEPARATOR: &str = "|";
}

/// Rate limiting and timeouts
pub mod timing {
    /// Delay before every geocoding request (Nominatim allows 1 req/s)
    pub const GEOCODE_DELAY_MS: u64 = 1000;

    /// Outer bound on the whole device location attempt
    pub const DEVICE_TIMEOUT_SECS: u64 = 6;

    /// Timeout passed to the device location request itself
    pub const DEVICE_REQUEST_TIMEOUT_SECS: u64 = 5;

    /// Oldest cached device fix the request accepts
    pub const DEVICE_MAXIMUM_AGE_SECS: u64 = 300;
}
