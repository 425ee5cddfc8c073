//! Geocoding and location
//!
//! Address geocoding behind a TTL cache, device and IP geolocation, and
//! [`GeoService`], which wires them together from configuration.

pub mod cache;
pub mod device;
pub mod ip_location;
pub mod location;
pub mod nominatim;
pub mod resolver;

use crate::config::Config;
use crate::coord::distance::haversine_km;
use crate::coord::Coordinates;
use crate::error::Result;
use cache::{FileStore, GeoCache, KeyValueStore, MemoryStore, SystemClock};
use device::{ConfiguredDevice, DeviceLocator, PositionOptions};
use ip_location::{IpLocationBackend, IpLocator};
use location::{LocationResolver, LocationTask, ResolvedLocation};
use nominatim::NominatimBackend;
use resolver::GeocodeResolver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A geocoded location result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude
    pub lat: f64,
    /// Longitude
    pub lng: f64,
    /// Display name (address or description)
    pub display_name: String,
}

/// Trait for geocoding backends
pub trait GeoBackend: Send + Sync {
    /// Geocode a location string to coordinates
    ///
    /// Returns the best match for the query, or None if not found
    fn geocode(&self, query: &str) -> impl std::future::Future<Output = Result<Option<GeoLocation>>> + Send;
}

/// Geocoder, location resolver and cache built once and passed around
#[derive(Debug)]
pub struct GeoService<B = NominatimBackend, D = ConfiguredDevice, I = IpLocator> {
    geocoder: GeocodeResolver<B>,
    locator: Arc<LocationResolver<D, I>>,
}

impl GeoService {
    /// Build the service described by `config`
    ///
    /// With `cache.enabled = false` lookups are cached in memory for the
    /// lifetime of the service only.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn KeyValueStore> = if config.cache.enabled {
            Arc::new(FileStore::new(config.cache_dir()?))
        } else {
            Arc::new(MemoryStore::new())
        };
        let cache = GeoCache::with_ttl_days(store, Arc::new(SystemClock), config.cache.ttl_days);

        let geocoder = GeocodeResolver::new(
            NominatimBackend::from_config(&config.geocoder)?,
            cache,
            config.geocoder.country_name.clone(),
            Duration::from_millis(config.geocoder.delay_ms),
        );

        let mut locator = LocationResolver::new(
            ConfiguredDevice::from_config(&config.location),
            IpLocator::from_config(&config.location)?,
            PositionOptions::from_config(&config.location),
            Duration::from_secs(config.location.device_timeout_secs),
        );
        if !config.location.use_device {
            locator = locator.without_device();
        }

        Ok(Self::new(geocoder, locator))
    }
}

impl<B, D, I> GeoService<B, D, I>
where
    B: GeoBackend,
    D: DeviceLocator + 'static,
    I: IpLocationBackend + 'static,
{
    pub fn new(geocoder: GeocodeResolver<B>, locator: LocationResolver<D, I>) -> Self {
        Self {
            geocoder,
            locator: Arc::new(locator),
        }
    }

    /// Coordinates for an address and optional place name
    pub async fn geocode(&self, address: &str, name_hint: &str) -> Option<Coordinates> {
        self.geocoder.resolve(address, name_hint).await
    }

    /// Current location, device first then IP
    pub async fn locate(&self) -> Option<ResolvedLocation> {
        self.locator.resolve().await
    }

    /// Current location as a cancellable background task
    pub fn spawn_locate(&self) -> LocationTask {
        Arc::clone(&self.locator).spawn()
    }

    /// Great-circle distance in kilometers
    pub fn distance_km(&self, from: Coordinates, to: Coordinates) -> f64 {
        haversine_km(from, to)
    }

    pub fn cache(&self) -> &GeoCache {
        self.geocoder.cache()
    }

    pub fn geocoder(&self) -> &GeocodeResolver<B> {
        &self.geocoder
    }

    pub fn locator(&self) -> &LocationResolver<D, I> {
        &self.locator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::cache::{cache_key, CacheMap, ManualClock};
    use crate::geo::device::FixedDevice;
    use crate::geo::location::LocationSource;
    use tempfile::TempDir;

    #[test]
    fn test_geo_location_serialization() {
        let loc = GeoLocation {
            lat: 10.7769,
            lng: 106.7009,
            display_name: "Ho Chi Minh City".to_string(),
        };

        let json = serde_json::to_string(&loc).unwrap();
        let parsed: GeoLocation = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.lat, 10.7769);
        assert_eq!(parsed.display_name, "Ho Chi Minh City");
    }

    #[test]
    fn test_from_config() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.cache.dir = Some(temp_dir.path().to_path_buf());

        let service = GeoService::from_config(&config).unwrap();
        assert_eq!(service.cache().ttl(), Duration::from_secs(7 * 24 * 60 * 60));
        assert_eq!(service.locator().device_timeout(), Duration::from_secs(6));
        assert_eq!(service.geocoder().backend().country_code(), "vn");
        assert!(service.locator().uses_device());
    }

    #[tokio::test]
    async fn test_from_config_without_device() {
        let mut config = Config::default();
        config.cache.enabled = false;
        config.location.ip_url = "http://127.0.0.1:9".to_string();
        config.location.fixed_lat = Some(10.77);
        config.location.fixed_lng = Some(106.70);
        config.location.use_device = false;

        let service = GeoService::from_config(&config).unwrap();
        assert!(!service.locator().uses_device());
        // Fixed device skipped, and the unreachable IP service yields nothing
        assert_eq!(service.locate().await, None);
    }

    #[tokio::test]
    async fn test_service_uses_prefilled_cache_and_fixed_device() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = GeoCache::with_ttl_days(Arc::new(MemoryStore::new()), clock, 7);
        let mut map = CacheMap::new();
        cache.insert(&mut map, cache_key("Thu Duc", ""), Coordinates::new(10.85, 106.75));
        cache.store(&map);

        let geocoder = GeocodeResolver::new(
            NominatimBackend::with_base_url("http://127.0.0.1:9", "vn", "test").unwrap(),
            cache,
            "Vietnam",
            Duration::ZERO,
        );
        let locator = LocationResolver::new(
            FixedDevice::new(Coordinates::new(10.77, 106.70)),
            IpLocator::with_url("http://127.0.0.1:9").unwrap(),
            PositionOptions::default(),
            Duration::from_secs(6),
        );
        let service = GeoService::new(geocoder, locator);

        let center = service.geocode("thu duc", "").await.unwrap();
        let here = service.spawn_locate().join().await.unwrap();

        assert_eq!(here.source, LocationSource::Device);
        let km = service.distance_km(here.coords, center);
        assert!(km > 5.0 && km < 20.0, "got {}", km);
    }
}
