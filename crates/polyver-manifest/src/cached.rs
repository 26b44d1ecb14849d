use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use polyver_core::fsutil::write_atomic;

use crate::source::ManifestSource;
use crate::types::{FetchedManifest, Manifest, ManifestError};

/// Default time-to-live for a cached manifest.
pub const DEFAULT_CACHE_TTL_HOURS: i64 = 24;

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    fetched_at: DateTime<Utc>,
    manifest: Manifest,
}

/// Wraps another source with a per-runtime disk cache.
///
/// Within the TTL the cached payload is served without touching the wrapped
/// source. Past the TTL the wrapped source is consulted and the result
/// persisted with a fresh timestamp. If the wrapped source fails and any
/// entry exists, the stale entry is served instead of propagating the
/// failure: staleness beats unavailability.
pub struct CachedSource {
    inner: Box<dyn ManifestSource>,
    cache_dir: PathBuf,
    ttl: Duration,
}

impl CachedSource {
    #[must_use]
    pub fn new(inner: Box<dyn ManifestSource>, cache_dir: PathBuf, ttl: Duration) -> Self {
        Self {
            inner,
            cache_dir,
            ttl,
        }
    }

    fn cache_file(&self, runtime: &str) -> PathBuf {
        self.cache_dir.join(format!("{runtime}.json"))
    }

    fn load_entry(&self, runtime: &str) -> Option<CacheEntry> {
        let data = std::fs::read_to_string(self.cache_file(runtime)).ok()?;
        match serde_json::from_str(&data) {
            Ok(entry) => Some(entry),
            Err(err) => {
                log::warn!("Discarding corrupt manifest cache for {runtime}: {err}");
                None
            }
        }
    }

    fn store_entry(&self, runtime: &str, manifest: &Manifest) {
        let entry = CacheEntry {
            fetched_at: Utc::now(),
            manifest: manifest.clone(),
        };
        let Ok(data) = serde_json::to_vec(&entry) else {
            return;
        };
        if let Err(err) = std::fs::create_dir_all(&self.cache_dir)
            .and_then(|()| write_atomic(&self.cache_file(runtime), &data))
        {
            log::warn!("Failed to persist manifest cache for {runtime}: {err}");
        }
    }
}

#[async_trait]
impl ManifestSource for CachedSource {
    fn name(&self) -> &'static str {
        "cached"
    }

    async fn fetch_manifest(&self, runtime: &str) -> Result<FetchedManifest, ManifestError> {
        let entry = self.load_entry(runtime);

        if let Some(entry) = &entry
            && Utc::now() - entry.fetched_at < self.ttl
        {
            return Ok(FetchedManifest {
                manifest: entry.manifest.clone(),
                origin: "cache",
            });
        }

        match self.inner.fetch_manifest(runtime).await {
            Ok(fetched) => {
                self.store_entry(runtime, &fetched.manifest);
                Ok(fetched)
            }
            Err(error) => {
                if let Some(entry) = entry {
                    log::warn!(
                        "Manifest source {:?} failed ({error}); serving stale cache for {runtime}",
                        self.inner.name()
                    );
                    return Ok(FetchedManifest {
                        manifest: entry.manifest,
                        origin: "stale-cache",
                    });
                }
                Err(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::types::DownloadDescriptor;

    struct CountingSource {
        calls: AtomicUsize,
        result: Result<Manifest, ()>,
    }

    impl CountingSource {
        fn succeeding(manifest: Manifest) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Ok(manifest),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                result: Err(()),
            }
        }
    }

    #[async_trait]
    impl ManifestSource for &CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_manifest(&self, _runtime: &str) -> Result<FetchedManifest, ManifestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result
                .clone()
                .map(|manifest| FetchedManifest {
                    manifest,
                    origin: "counting",
                })
                .map_err(|()| ManifestError::Request {
                    url: "https://example.invalid".to_string(),
                    details: "forced failure".to_string(),
                })
        }
    }

    fn sample_manifest() -> Manifest {
        let mut manifest = Manifest::default();
        manifest.versions.entry("22.15.1".to_string()).or_default().insert(
            "linux-amd64".to_string(),
            DownloadDescriptor {
                url: "https://example.invalid/node.tar.gz".to_string(),
                sha256: None,
            },
        );
        manifest
    }

    fn leak(source: CountingSource) -> &'static CountingSource {
        Box::leak(Box::new(source))
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_hits_cache_only() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let inner = leak(CountingSource::succeeding(sample_manifest()));
        let cached = CachedSource::new(
            Box::new(inner),
            temp.path().to_path_buf(),
            Duration::hours(DEFAULT_CACHE_TTL_HOURS),
        );

        let first = cached.fetch_manifest("node").await.unwrap();
        let second = cached.fetch_manifest("node").await.unwrap();

        assert_eq!(first.manifest, second.manifest);
        assert_eq!(first.origin, "counting");
        assert_eq!(second.origin, "cache");
        assert_eq!(inner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_entry_delegates_and_refreshes() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let inner = leak(CountingSource::succeeding(sample_manifest()));
        let cached = CachedSource::new(
            Box::new(inner),
            temp.path().to_path_buf(),
            Duration::zero(),
        );

        cached.fetch_manifest("node").await.unwrap();
        cached.fetch_manifest("node").await.unwrap();

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stale_entry_is_served_when_inner_fails() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");

        // Seed the cache, then expire it immediately with a zero TTL.
        let seeder = leak(CountingSource::succeeding(sample_manifest()));
        CachedSource::new(Box::new(seeder), temp.path().to_path_buf(), Duration::zero())
            .fetch_manifest("node")
            .await
            .unwrap();

        let failing = leak(CountingSource::failing());
        let cached = CachedSource::new(
            Box::new(failing),
            temp.path().to_path_buf(),
            Duration::zero(),
        );

        let fetched = cached.fetch_manifest("node").await.unwrap();
        assert_eq!(fetched.origin, "stale-cache");
        assert!(fetched.manifest.descriptor("22.15.1", "linux-amd64").is_some());
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_without_cache_propagates() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let failing = leak(CountingSource::failing());
        let cached = CachedSource::new(
            Box::new(failing),
            temp.path().to_path_buf(),
            Duration::hours(1),
        );

        assert!(matches!(
            cached.fetch_manifest("node").await,
            Err(ManifestError::Request { .. })
        ));
    }
}
