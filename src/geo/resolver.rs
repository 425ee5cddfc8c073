//! Cached, rate-limited address geocoding
//!
//! [`GeocodeResolver`] turns an address and/or a place name into
//! coordinates. Lookups go through the [`GeoCache`] first; on a miss a
//! handful of query variants are sent to the backend one at a time, each
//! preceded by a fixed delay, until one of them yields coordinates.
//!
//! Resolution never fails loudly: every error is logged and the caller
//! gets `None`.

use crate::coord::Coordinates;
use crate::geo::cache::{cache_key, GeoCache};
use crate::geo::GeoBackend;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Geocoder with a TTL cache in front of a [`GeoBackend`]
#[derive(Debug)]
pub struct GeocodeResolver<B> {
    backend: B,
    cache: GeoCache,
    country_name: String,
    delay: Duration,
}

impl<B: GeoBackend> GeocodeResolver<B> {
    /// # Arguments
    /// * `backend` - Geocoding service, already restricted to one country
    /// * `cache` - Cache consulted before and updated after each lookup
    /// * `country_name` - Qualifier appended to the address in the second query variant
    /// * `delay` - Wait before every backend request
    pub fn new(backend: B, cache: GeoCache, country_name: impl Into<String>, delay: Duration) -> Self {
        Self {
            backend,
            cache,
            country_name: country_name.into(),
            delay,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn cache(&self) -> &GeoCache {
        &self.cache
    }

    /// Resolve an address and optional name hint to coordinates
    ///
    /// Returns `None` when both inputs are blank (without touching the
    /// network) or when no query variant produces valid coordinates.
    pub async fn resolve(&self, address: &str, name_hint: &str) -> Option<Coordinates> {
        if address.trim().is_empty() && name_hint.trim().is_empty() {
            return None;
        }

        let key = cache_key(address, name_hint);
        let mut map = self.cache.load();

        if let Some(coords) = self.cache.fresh(&map, &key) {
            debug!(key = %key, "geocode cache hit");
            return Some(coords);
        }
        debug!(key = %key, "geocode cache miss");

        for query in query_variants(address, name_hint, &self.country_name) {
            tokio::time::sleep(self.delay).await;

            match self.backend.geocode(&query).await {
                Ok(Some(location)) => match Coordinates::checked(location.lat, location.lng) {
                    Ok(coords) => {
                        info!(query = %query, lat = coords.lat, lng = coords.lng, "geocoded");
                        self.cache.insert(&mut map, key, coords);
                        self.cache.store(&map);
                        return Some(coords);
                    }
                    Err(e) => {
                        warn!(query = %query, error = %e, "geocoder returned unusable coordinates");
                    }
                },
                Ok(None) => {
                    debug!(query = %query, "no geocoding match");
                }
                Err(e) => {
                    warn!(query = %query, error = %e, "geocoding query failed");
                }
            }
        }

        debug!(key = %key, "all geocoding variants exhausted");
        None
    }
}

/// Query variants tried in order on a cache miss
///
/// 1. the address as given
/// 2. the address with the country appended
/// 3. the name hint followed by the address (or the hint alone)
///
/// Blank variants and repeats are skipped.
pub fn query_variants(address: &str, name_hint: &str, country_name: &str) -> Vec<String> {
    let address = address.trim();
    let name_hint = name_hint.trim();
    let country_name = country_name.trim();

    let mut candidates = Vec::with_capacity(3);

    if !address.is_empty() {
        candidates.push(address.to_string());
        if !country_name.is_empty() {
            candidates.push(format!("{}, {}", address, country_name));
        }
    }

    match (name_hint.is_empty(), address.is_empty()) {
        (false, false) => candidates.push(format!("{}, {}", name_hint, address)),
        (false, true) => candidates.push(name_hint.to_string()),
        _ => {}
    }

    let mut variants: Vec<String> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::geo::cache::{Clock, KeyValueStore, ManualClock, MemoryStore};
    use crate::geo::GeoLocation;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use tokio::time::Instant;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    /// Backend replaying canned responses and recording queries
    #[derive(Default)]
    struct ScriptedBackend {
        responses: Mutex<VecDeque<Result<Option<GeoLocation>>>>,
        queries: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(responses: Vec<Result<Option<GeoLocation>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                queries: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.queries.lock().unwrap().len()
        }

        fn queries(&self) -> Vec<String> {
            self.queries.lock().unwrap().clone()
        }
    }

    impl GeoBackend for ScriptedBackend {
        async fn geocode(&self, query: &str) -> Result<Option<GeoLocation>> {
            self.queries.lock().unwrap().push(query.to_string());
            self.responses.lock().unwrap().pop_front().unwrap_or(Ok(None))
        }
    }

    fn found(lat: f64, lng: f64) -> Result<Option<GeoLocation>> {
        Ok(Some(GeoLocation {
            lat,
            lng,
            display_name: "somewhere".to_string(),
        }))
    }

    fn resolver(
        responses: Vec<Result<Option<GeoLocation>>>,
    ) -> (GeocodeResolver<ScriptedBackend>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_760_000_000_000));
        let cache = GeoCache::with_ttl_days(Arc::new(MemoryStore::new()), clock.clone(), 7);
        let resolver = GeocodeResolver::new(
            ScriptedBackend::new(responses),
            cache,
            "Vietnam",
            Duration::from_secs(1),
        );
        (resolver, clock)
    }

    /// Store that reads as empty and refuses writes
    struct FullStore;

    impl KeyValueStore for FullStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::Cache("storage unavailable".to_string()))
        }

        fn set_item(&self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::Cache("quota exceeded".to_string()))
        }

        fn remove_item(&self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_query_variants_full() {
        assert_eq!(
            query_variants(" 12 Nguyen Hue ", "VinFast Q1", "Vietnam"),
            vec![
                "12 Nguyen Hue".to_string(),
                "12 Nguyen Hue, Vietnam".to_string(),
                "VinFast Q1, 12 Nguyen Hue".to_string(),
            ]
        );
    }

    #[test]
    fn test_query_variants_skip_empty() {
        assert_eq!(
            query_variants("12 Nguyen Hue", "", "Vietnam"),
            vec!["12 Nguyen Hue".to_string(), "12 Nguyen Hue, Vietnam".to_string()]
        );
        assert_eq!(query_variants("", "VinFast Q1", "Vietnam"), vec!["VinFast Q1".to_string()]);
        assert_eq!(query_variants("Hue", "", ""), vec!["Hue".to_string()]);
        assert!(query_variants("  ", " ", "Vietnam").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_inputs_skip_network() {
        let (resolver, _) = resolver(vec![found(1.0, 2.0)]);
        assert_eq!(resolver.resolve("", "").await, None);
        assert_eq!(resolver.resolve("   ", "\t").await, None);
        assert_eq!(resolver.backend().calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_lookup_served_from_cache() {
        let (resolver, _) = resolver(vec![found(10.7769, 106.7009)]);

        let first = resolver.resolve("12 Nguyen Hue", "").await;
        let second = resolver.resolve("  12 NGUYEN HUE ", "").await;

        assert_eq!(first, Some(Coordinates::new(10.7769, 106.7009)));
        assert_eq!(second, first);
        assert_eq!(resolver.backend().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_a_miss() {
        let (resolver, clock) = resolver(vec![found(1.0, 1.0), found(2.0, 2.0)]);

        assert_eq!(resolver.resolve("Da Nang", "").await, Some(Coordinates::new(1.0, 1.0)));

        clock.advance(7 * DAY + Duration::from_millis(1));
        let key = cache_key("Da Nang", "");
        assert!(resolver.cache().get(&key).is_some());

        assert_eq!(resolver.resolve("Da Nang", "").await, Some(Coordinates::new(2.0, 2.0)));
        assert_eq!(resolver.backend().calls(), 2);

        // Fresh resolution overwrote the entry
        let entry = resolver.cache().get(&key).unwrap();
        assert_eq!(entry.coords, Coordinates::new(2.0, 2.0));
        assert_eq!(entry.timestamp, clock.now_millis());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_variants_fall_through() {
        let (resolver, _) = resolver(vec![
            Err(Error::Geocoding("connection reset".to_string())),
            Err(Error::Geocoding("503".to_string())),
            found(16.0544, 108.2022),
        ]);

        let result = resolver.resolve("Hai Chau", "Service Center").await;

        assert_eq!(result, Some(Coordinates::new(16.0544, 108.2022)));
        assert_eq!(
            resolver.backend().queries(),
            vec![
                "Hai Chau".to_string(),
                "Hai Chau, Vietnam".to_string(),
                "Service Center, Hai Chau".to_string(),
            ]
        );
        let cached = resolver.cache().get(&cache_key("Hai Chau", "Service Center"));
        assert_eq!(cached.map(|e| e.coords), result);
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_variants_fail() {
        let (resolver, _) = resolver(vec![
            Ok(None),
            Err(Error::Geocoding("timeout".to_string())),
            found(200.0, 0.0),
        ]);

        assert_eq!(resolver.resolve("Nowhere", "Nothing").await, None);
        assert_eq!(resolver.backend().calls(), 3);
        assert!(resolver.cache().load().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_storage_failures_do_not_block_resolution() {
        let cache = GeoCache::with_ttl_days(Arc::new(FullStore), Arc::new(ManualClock::new(0)), 7);
        let resolver = GeocodeResolver::new(
            ScriptedBackend::new(vec![found(21.0285, 105.8542), found(21.0285, 105.8542)]),
            cache,
            "Vietnam",
            Duration::from_secs(1),
        );

        assert_eq!(resolver.resolve("Hoan Kiem", "").await, Some(Coordinates::new(21.0285, 105.8542)));
        // Nothing persisted, so the next lookup goes back to the backend
        assert_eq!(resolver.resolve("Hoan Kiem", "").await, Some(Coordinates::new(21.0285, 105.8542)));
        assert_eq!(resolver.backend().calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_at_first_match() {
        let (resolver, _) = resolver(vec![found(1.0, 2.0), found(3.0, 4.0)]);
        assert_eq!(resolver.resolve("Hue", "Citadel").await, Some(Coordinates::new(1.0, 2.0)));
        assert_eq!(resolver.backend().calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_are_spaced_by_delay() {
        let (resolver, _) = resolver(vec![Ok(None), Ok(None), Ok(None)]);
        let start = Instant::now();

        resolver.resolve("Can Tho", "Ninh Kieu").await;

        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(resolver.backend().calls(), 3);
    }
}
