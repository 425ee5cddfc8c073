//! Default configuration values
//!
//! Named constants for all tunable parameters

use crate::constants::{api, cache, timing};

/// Default geocoding service
pub const DEFAULT_GEOCODER_URL: &str = api::NOMINATIM_URL;

/// Default country searches are restricted to (ISO 3166-1 alpha-2)
pub const DEFAULT_COUNTRY_CODE: &str = "vn";

/// Default country qualifier appended to addresses
pub const DEFAULT_COUNTRY_NAME: &str = "Vietnam";

/// Default delay before each geocoding request
pub const DEFAULT_DELAY_MS: u64 = timing::GEOCODE_DELAY_MS;

/// Default User-Agent for the geocoding service
pub const DEFAULT_USER_AGENT: &str = api::USER_AGENT;

/// Default geocode cache lifetime
pub const DEFAULT_TTL_DAYS: u64 = cache::GEOCODE_TTL_DAYS;

/// Default IP geolocation service
pub const DEFAULT_IP_URL: &str = api::IP_API_URL;

/// Default outer timeout on the device location attempt
pub const DEFAULT_DEVICE_TIMEOUT_SECS: u64 = timing::DEVICE_TIMEOUT_SECS;

/// Default timeout handed to the device request
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = timing::DEVICE_REQUEST_TIMEOUT_SECS;

/// Default maximum age of a cached device fix
pub const DEFAULT_MAXIMUM_AGE_SECS: u64 = timing::DEVICE_MAXIMUM_AGE_SECS;

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 7979;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Application directory name (for XDG paths)
pub const APP_DIR_NAME: &str = "ev-locate";
