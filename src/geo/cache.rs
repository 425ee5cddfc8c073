//! Geocode cache
//!
//! Geocoding results keyed by normalized address text, stored as a single
//! JSON blob under one key of a [`KeyValueStore`]. Entries older than the
//! TTL are treated as misses but stay in the blob until explicitly pruned.

use crate::constants::cache::{GEOCODE_CACHE_KEY, KEY_SEPARATOR, MILLIS_PER_DAY};
use crate::coord::Coordinates;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// String key-value storage holding serialized blobs
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn set_item(&self, key: &str, value: &str) -> Result<()>;

    /// Delete `key` (no error if absent)
    fn remove_item(&self, key: &str) -> Result<()>;
}

/// Directory-backed store, one file per key
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Store files inside `dir` (created on first write)
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Platform cache directory, e.g. ~/.cache/ev-locate
    pub fn default_dir() -> Result<PathBuf> {
        dirs::cache_dir()
            .map(|p| p.join("ev-locate"))
            .ok_or_else(|| Error::Cache("Could not determine cache directory".to_string()))
    }

    /// Directory holding the files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn items(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.items
            .lock()
            .map_err(|_| Error::Cache("Memory store lock poisoned".to_string()))
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items()?.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.items()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<()> {
        self.items()?.remove(key);
        Ok(())
    }
}

/// Source of the current time in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// A cached geocoding result
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    #[serde(flatten)]
    pub coords: Coordinates,
    /// When the entry was written (epoch milliseconds)
    pub timestamp: i64,
}

/// The whole persisted cache
pub type CacheMap = HashMap<String, CacheEntry>;

/// Counts reported by [`GeoCache::stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub total: usize,
    pub fresh: usize,
    pub expired: usize,
}

/// Build the cache key for an address and optional name hint
///
/// Both parts are trimmed and lower-cased, then joined with `|`.
pub fn cache_key(address: &str, name_hint: &str) -> String {
    format!(
        "{}{}{}",
        address.trim().to_lowercase(),
        KEY_SEPARATOR,
        name_hint.trim().to_lowercase()
    )
}

/// TTL-checked geocode cache over a key-value store
#[derive(Clone)]
pub struct GeoCache {
    store: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl std::fmt::Debug for GeoCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeoCache").field("ttl", &self.ttl).finish()
    }
}

impl GeoCache {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Cache with a TTL given in days
    pub fn with_ttl_days(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>, days: u64) -> Self {
        let ttl = Duration::from_millis(days.saturating_mul(MILLIS_PER_DAY as u64));
        Self::new(store, clock, ttl)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    /// Read the whole cache map
    ///
    /// A missing, unreadable or corrupt blob yields an empty map.
    pub fn load(&self) -> CacheMap {
        let raw = match self.store.get_item(GEOCODE_CACHE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return CacheMap::new(),
            Err(e) => {
                debug!(error = %e, "geocode cache unreadable, starting empty");
                return CacheMap::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            debug!(error = %e, "geocode cache corrupt, starting empty");
            CacheMap::new()
        })
    }

    /// Write the whole cache map back; failures are logged and dropped
    pub fn store(&self, map: &CacheMap) {
        let result = serde_json::to_string(map)
            .map_err(Error::from)
            .and_then(|raw| self.store.set_item(GEOCODE_CACHE_KEY, &raw));

        if let Err(e) = result {
            debug!(error = %e, "failed to write geocode cache");
        }
    }

    /// Stored entry for `key`, fresh or not
    pub fn get(&self, key: &str) -> Option<CacheEntry> {
        self.load().get(key).copied()
    }

    /// Whether `entry` is younger than the TTL
    pub fn is_fresh(&self, entry: &CacheEntry) -> bool {
        let ttl = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        let age = self.clock.now_millis().saturating_sub(entry.timestamp);
        age < ttl
    }

    /// Coordinates for `key` in `map` if the entry is still fresh
    pub fn fresh(&self, map: &CacheMap, key: &str) -> Option<Coordinates> {
        map.get(key)
            .filter(|entry| self.is_fresh(entry))
            .map(|entry| entry.coords)
    }

    /// Stamp `coords` with the current time and put it in `map`
    pub fn insert(&self, map: &mut CacheMap, key: String, coords: Coordinates) {
        let entry = CacheEntry {
            coords,
            timestamp: self.clock.now_millis(),
        };
        map.insert(key, entry);
    }

    /// Count fresh and expired entries
    pub fn stats(&self) -> CacheStats {
        let map = self.load();
        let fresh = map.values().filter(|e| self.is_fresh(e)).count();
        CacheStats {
            total: map.len(),
            fresh,
            expired: map.len() - fresh,
        }
    }

    /// Delete every entry
    pub fn clear(&self) -> Result<()> {
        self.store.remove_item(GEOCODE_CACHE_KEY)
    }

    /// Drop expired entries, returning how many were removed
    pub fn prune_expired(&self) -> usize {
        let mut map = self.load();
        let before = map.len();
        map.retain(|_, entry| self.is_fresh(entry));
        let removed = before - map.len();
        if removed > 0 {
            self.store(&map);
        }
        removed
    }
}
