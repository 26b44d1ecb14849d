use std::sync::{Arc, OnceLock};

use chrono::Duration;

use polyver_core::AppPaths;

use crate::cached::{CachedSource, DEFAULT_CACHE_TTL_HOURS};
use crate::embedded::EmbeddedSource;
use crate::fallback::FallbackSource;
use crate::http::{DEFAULT_REMOTE_URL, HttpSource};
use crate::source::ManifestSource;

static DEFAULT_CHAIN: OnceLock<Arc<dyn ManifestSource>> = OnceLock::new();

/// The default layered lookup, constructed once per process:
/// `Fallback(Cached(Remote), Embedded)` — fresh if possible, stale if the
/// network is degraded, embedded if disk and network are both unavailable.
pub fn default_chain() -> Arc<dyn ManifestSource> {
    Arc::clone(DEFAULT_CHAIN.get_or_init(build_default_chain))
}

fn build_default_chain() -> Arc<dyn ManifestSource> {
    let remote = Box::new(HttpSource::new(DEFAULT_REMOTE_URL));

    let primary: Box<dyn ManifestSource> = match AppPaths::new() {
        Ok(paths) => Box::new(CachedSource::new(
            remote,
            paths.manifest_cache_dir(),
            Duration::hours(DEFAULT_CACHE_TTL_HOURS),
        )),
        Err(err) => {
            // No usable cache directory; run the chain without the disk layer.
            log::warn!("Manifest cache unavailable ({err}); using remote without cache");
            remote
        }
    };

    Arc::new(FallbackSource::new(primary, Box::new(EmbeddedSource::new())))
}
