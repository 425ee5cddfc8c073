//! Configuration management
//!
//! Loads and saves configuration from XDG-compliant paths.
//! Config location: ~/.config/ev-locate/config.toml

pub mod defaults;

use crate::error::{Error, Result};
use crate::geo::cache::FileStore;
use defaults::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Geocoding service settings
    #[serde(default)]
    pub geocoder: GeocoderConfig,

    /// Geocode cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Current location settings
    #[serde(default)]
    pub location: LocationConfig,

    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Geocoding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocoderConfig {
    /// Nominatim base URL
    #[serde(default = "default_geocoder_url")]
    pub base_url: String,

    /// Country searches are restricted to
    #[serde(default = "default_country_code")]
    pub country_code: String,

    /// Country name appended to addresses
    #[serde(default = "default_country_name")]
    pub country_name: String,

    /// Delay before each request in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// User-Agent sent with each request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Geocode cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Persist lookups across runs
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Entry lifetime in days
    #[serde(default = "default_ttl_days")]
    pub ttl_days: u64,

    /// Cache directory (platform cache dir if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
}

/// Current location settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Try the device before IP geolocation
    #[serde(default = "default_true")]
    pub use_device: bool,

    /// IP geolocation service URL
    #[serde(default = "default_ip_url")]
    pub ip_url: String,

    /// Outer bound on the device attempt in seconds
    #[serde(default = "default_device_timeout")]
    pub device_timeout_secs: u64,

    /// Timeout handed to the device request in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Oldest acceptable cached device fix in seconds
    #[serde(default = "default_maximum_age")]
    pub maximum_age_secs: u64,

    /// Ask the device for a high-accuracy fix
    #[serde(default)]
    pub high_accuracy: bool,

    /// Fixed device latitude (terminals with a known position)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_lat: Option<f64>,

    /// Fixed device longitude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed_lng: Option<f64>,
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions for serde
fn default_geocoder_url() -> String {
    DEFAULT_GEOCODER_URL.to_string()
}
fn default_country_code() -> String {
    DEFAULT_COUNTRY_CODE.to_string()
}
fn default_country_name() -> String {
    DEFAULT_COUNTRY_NAME.to_string()
}
fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_true() -> bool {
    true
}
fn default_ttl_days() -> u64 {
    DEFAULT_TTL_DAYS
}
fn default_ip_url() -> String {
    DEFAULT_IP_URL.to_string()
}
fn default_device_timeout() -> u64 {
    DEFAULT_DEVICE_TIMEOUT_SECS
}
fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
fn default_maximum_age() -> u64 {
    DEFAULT_MAXIMUM_AGE_SECS
}
fn default_host() -> String {
    DEFAULT_HOST.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoder_url(),
            country_code: default_country_code(),
            country_name: default_country_name(),
            delay_ms: default_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_days: default_ttl_days(),
            dir: None,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            use_device: true,
            ip_url: default_ip_url(),
            device_timeout_secs: default_device_timeout(),
            request_timeout_secs: default_request_timeout(),
            maximum_age_secs: default_maximum_age(),
            high_accuracy: false,
            fixed_lat: None,
            fixed_lng: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid value for {}: {}", key, value)))
}

/// Parse an optional degree value; an empty string clears it
fn parse_degrees(key: &str, value: &str, limit: f64) -> Result<Option<f64>> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    let degrees: f64 = parse_value(key, value)?;
    if !degrees.is_finite() || degrees.abs() > limit {
        return Err(Error::Config(format!(
            "{} must be within [-{}, {}]: {}",
            key, limit, limit, value
        )));
    }
    Ok(Some(degrees))
}

fn optional_to_string(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR_NAME))
            .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default path
    ///
    /// Creates default config if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from a specific path, creating it if missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                Error::Config(format!("Failed to read config file: {}", e))
            })?;

            toml::from_str(&content).map_err(|e| {
                Error::Config(format!("Failed to parse config file: {}", e))
            })
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                Error::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::Config(format!("Failed to serialize config: {}", e))
        })?;

        fs::write(path, content).map_err(|e| {
            Error::Config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Directory holding the geocode cache
    pub fn cache_dir(&self) -> Result<PathBuf> {
        match &self.cache.dir {
            Some(dir) => Ok(dir.clone()),
            None => FileStore::default_dir(),
        }
    }

    /// Get a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns the value as a string, or None if not found
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "base_url"] => Some(self.geocoder.base_url.clone()),
            ["geocoder", "country_code"] => Some(self.geocoder.country_code.clone()),
            ["geocoder", "country_name"] => Some(self.geocoder.country_name.clone()),
            ["geocoder", "delay_ms"] => Some(self.geocoder.delay_ms.to_string()),
            ["geocoder", "user_agent"] => Some(self.geocoder.user_agent.clone()),

            ["cache", "enabled"] => Some(self.cache.enabled.to_string()),
            ["cache", "ttl_days"] => Some(self.cache.ttl_days.to_string()),
            ["cache", "dir"] => Some(
                self.cache
                    .dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_default(),
            ),

            ["location", "use_device"] => Some(self.location.use_device.to_string()),
            ["location", "ip_url"] => Some(self.location.ip_url.clone()),
            ["location", "device_timeout_secs"] => {
                Some(self.location.device_timeout_secs.to_string())
            }
            ["location", "request_timeout_secs"] => {
                Some(self.location.request_timeout_secs.to_string())
            }
            ["location", "maximum_age_secs"] => Some(self.location.maximum_age_secs.to_string()),
            ["location", "high_accuracy"] => Some(self.location.high_accuracy.to_string()),
            ["location", "fixed_lat"] => Some(optional_to_string(self.location.fixed_lat)),
            ["location", "fixed_lng"] => Some(optional_to_string(self.location.fixed_lng)),

            ["server", "host"] => Some(self.server.host.clone()),
            ["server", "port"] => Some(self.server.port.to_string()),

            _ => None,
        }
    }

    /// Set a configuration value by key path
    ///
    /// Key format: "section.key"
    /// Returns error if key is invalid or value type is wrong
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let parts: Vec<&str> = key.split('.').collect();

        match parts.as_slice() {
            ["geocoder", "base_url"] => self.geocoder.base_url = value.to_string(),
            ["geocoder", "country_code"] => {
                self.geocoder.country_code = value.trim().to_lowercase();
            }
            ["geocoder", "country_name"] => self.geocoder.country_name = value.to_string(),
            ["geocoder", "delay_ms"] => self.geocoder.delay_ms = parse_value(key, value)?,
            ["geocoder", "user_agent"] => self.geocoder.user_agent = value.to_string(),

            ["cache", "enabled"] => self.cache.enabled = parse_value(key, value)?,
            ["cache", "ttl_days"] => self.cache.ttl_days = parse_value(key, value)?,
            ["cache", "dir"] => {
                self.cache.dir = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }

            ["location", "use_device"] => self.location.use_device = parse_value(key, value)?,
            ["location", "ip_url"] => self.location.ip_url = value.to_string(),
            ["location", "device_timeout_secs"] => {
                self.location.device_timeout_secs = parse_value(key, value)?;
            }
            ["location", "request_timeout_secs"] => {
                self.location.request_timeout_secs = parse_value(key, value)?;
            }
            ["location", "maximum_age_secs"] => {
                self.location.maximum_age_secs = parse_value(key, value)?;
            }
            ["location", "high_accuracy"] => {
                self.location.high_accuracy = parse_value(key, value)?;
            }
            ["location", "fixed_lat"] => {
                self.location.fixed_lat = parse_degrees(key, value, 90.0)?;
            }
            ["location", "fixed_lng"] => {
                self.location.fixed_lng = parse_degrees(key, value, 180.0)?;
            }

            ["server", "host"] => self.server.host = value.to_string(),
            ["server", "port"] => self.server.port = parse_value(key, value)?,

            _ => {
                return Err(Error::Config(format!("Unknown config key: {}", key)));
            }
        }

        Ok(())
    }

    /// List all available config keys
    pub fn available_keys() -> Vec<&'static str> {
        vec![
            "geocoder.base_url",
            "geocoder.country_code",
            "geocoder.country_name",
            "geocoder.delay_ms",
            "geocoder.user_agent",
            "cache.enabled",
            "cache.ttl_days",
            "cache.dir",
            "location.use_device",
            "location.ip_url",
            "location.device_timeout_secs",
            "location.request_timeout_secs",
            "location.maximum_age_secs",
            "location.high_accuracy",
            "location.fixed_lat",
            "location.fixed_lng",
            "server.host",
            "server.port",
        ]
    }

    /// Get server address as "host:port"
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.geocoder.country_code, "vn");
        assert_eq!(config.geocoder.delay_ms, 1000);
        assert_eq!(config.cache.ttl_days, 7);
        assert!(config.cache.enabled);
        assert_eq!(config.location.device_timeout_secs, 6);
        assert_eq!(config.location.request_timeout_secs, 5);
        assert_eq!(config.server.port, 7979);
    }

    #[test]
    fn test_get_set() {
        let mut config = Config::default();

        assert_eq!(config.get("geocoder.country_name"), Some("Vietnam".to_string()));

        config.set("geocoder.country_code", " TH ").unwrap();
        assert_eq!(config.get("geocoder.country_code"), Some("th".to_string()));

        config.set("cache.ttl_days", "3").unwrap();
        assert_eq!(config.cache.ttl_days, 3);

        config.set("location.high_accuracy", "true").unwrap();
        assert!(config.location.high_accuracy);

        assert_eq!(config.get("location.use_device"), Some("true".to_string()));
        config.set("location.use_device", "false").unwrap();
        assert!(!config.location.use_device);
    }

    #[test]
    fn test_fixed_position_keys() {
        let mut config = Config::default();
        assert_eq!(config.get("location.fixed_lat"), Some(String::new()));

        config.set("location.fixed_lat", "10.5").unwrap();
        config.set("location.fixed_lng", "-106.25").unwrap();
        assert_eq!(config.location.fixed_lat, Some(10.5));
        assert_eq!(config.get("location.fixed_lng"), Some("-106.25".to_string()));

        assert!(config.set("location.fixed_lat", "91").is_err());
        assert!(config.set("location.fixed_lng", "nan").is_err());

        config.set("location.fixed_lat", "").unwrap();
        assert_eq!(config.location.fixed_lat, None);
    }

    #[test]
    fn test_get_invalid_key() {
        let config = Config::default();
        assert_eq!(config.get("invalid.key"), None);
    }

    #[test]
    fn test_set_invalid_key() {
        let mut config = Config::default();
        let result = config.set("invalid.key", "value");
        assert!(result.is_err());
    }

    #[test]
    fn test_set_invalid_value() {
        let mut config = Config::default();
        assert!(config.set("geocoder.delay_ms", "soon").is_err());
        assert!(config.set("cache.enabled", "maybe").is_err());
        assert!(config.set("server.port", "70000").is_err());
    }

    #[test]
    fn test_cache_dir() {
        let mut config = Config::default();
        config.set("cache.dir", "/tmp/ev-cache").unwrap();
        assert_eq!(config.cache_dir().unwrap(), PathBuf::from("/tmp/ev-cache"));

        config.set("cache.dir", "").unwrap();
        assert!(config.cache.dir.is_none());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.geocoder.country_name = "Viet Nam".to_string();
        config.location.fixed_lat = Some(10.0);
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.geocoder.country_name, "Viet Nam");
        assert_eq!(loaded.location.fixed_lat, Some(10.0));
        assert_eq!(loaded.location.fixed_lng, None);
    }

    #[test]
    fn test_load_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = Config::load_from(&path).unwrap();
        assert!(path.exists());
        assert_eq!(config.server.port, 7979);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str("[geocoder]\ncountry_code = \"la\"\n").unwrap();
        assert_eq!(config.geocoder.country_code, "la");
        assert_eq!(config.geocoder.delay_ms, 1000);
        assert_eq!(config.cache.ttl_days, 7);
    }

    #[test]
    fn test_serialization_format() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();

        assert!(toml.contains("[geocoder]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("[location]"));
        assert!(toml.contains("[server]"));
        assert!(!toml.contains("fixed_lat"));
    }

    #[test]
    fn test_server_addr() {
        let config = Config::default();
        assert_eq!(config.server_addr(), "127.0.0.1:7979");
    }

    #[test]
    fn test_available_keys_are_gettable() {
        let config = Config::default();
        for key in Config::available_keys() {
            assert!(config.get(key).is_some(), "{}", key);
        }
    }
}
