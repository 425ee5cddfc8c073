//! Cache command handler
//!
//! Shows, clears and prunes the on-disk geocode cache.

use crate::config::Config;
use crate::constants::cache::GEOCODE_CACHE_KEY;
use crate::error::Result;
use crate::geo::cache::{FileStore, GeoCache, SystemClock};
use clap::{Args, Subcommand};
use std::sync::Arc;

/// Cache command arguments
#[derive(Args)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand)]
pub enum CacheAction {
    /// Show entry counts
    Stats,

    /// Delete every cached lookup
    Clear,

    /// Delete expired lookups only
    Prune,

    /// Show the cache file path
    Path,
}

/// Run the cache command
pub fn run(args: CacheArgs) -> Result<()> {
    let config = Config::load()?;
    let store = FileStore::new(config.cache_dir()?);

    if let CacheAction::Path = args.action {
        println!("{}", store.path_for(GEOCODE_CACHE_KEY).display());
        return Ok(());
    }

    let cache = GeoCache::with_ttl_days(Arc::new(store), Arc::new(SystemClock), config.cache.ttl_days);

    match args.action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!("Entries: {}", stats.total);
            println!("  fresh:   {}", stats.fresh);
            println!("  expired: {}", stats.expired);
            println!("TTL: {} days", config.cache.ttl_days);
        }
        CacheAction::Clear => {
            cache.clear()?;
            println!("Geocode cache cleared");
        }
        CacheAction::Prune => {
            let removed = cache.prune_expired();
            println!("Removed {} expired entries", removed);
        }
        CacheAction::Path => {}
    }

    Ok(())
}
