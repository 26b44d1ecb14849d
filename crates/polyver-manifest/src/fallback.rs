use async_trait::async_trait;

use crate::source::ManifestSource;
use crate::types::{FetchedManifest, Manifest, ManifestError};

/// Tries a primary source, then a secondary on failure. The first success
/// wins; if both fail, the primary's error is returned as the more
/// informative one.
pub struct FallbackSource {
    primary: Box<dyn ManifestSource>,
    secondary: Box<dyn ManifestSource>,
}

impl FallbackSource {
    #[must_use]
    pub fn new(primary: Box<dyn ManifestSource>, secondary: Box<dyn ManifestSource>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl ManifestSource for FallbackSource {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn fetch_manifest(&self, runtime: &str) -> Result<FetchedManifest, ManifestError> {
        match self.primary.fetch_manifest(runtime).await {
            Ok(fetched) => Ok(fetched),
            Err(primary_error) => {
                log::warn!(
                    "Manifest source {:?} failed ({primary_error}); falling back to {:?}",
                    self.primary.name(),
                    self.secondary.name()
                );
                match self.secondary.fetch_manifest(runtime).await {
                    Ok(fetched) => Ok(fetched),
                    Err(secondary_error) => {
                        log::warn!(
                            "Fallback manifest source {:?} also failed: {secondary_error}",
                            self.secondary.name()
                        );
                        Err(primary_error)
                    }
                }
            }
        }
    }
}
