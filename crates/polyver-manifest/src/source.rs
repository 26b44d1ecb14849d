use async_trait::async_trait;

use crate::types::{FetchedManifest, ManifestError};

/// One layer of the manifest lookup. Implementations are composed into a
/// chain (`FallbackSource`, `CachedSource`) that decides which failures are
/// absorbed and which surface.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// A short identifier used for log provenance.
    fn name(&self) -> &'static str;

    /// Fetch the manifest snapshot for one runtime, tagged with the layer
    /// that ultimately produced it.
    ///
    /// # Errors
    /// Returns a `ManifestError` when this layer cannot produce a manifest;
    /// wrapping layers may absorb the failure.
    async fn fetch_manifest(&self, runtime: &str) -> Result<FetchedManifest, ManifestError>;
}
