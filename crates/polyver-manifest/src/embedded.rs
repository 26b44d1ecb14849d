use async_trait::async_trait;

use crate::source::ManifestSource;
use crate::types::{FetchedManifest, ManifestDocument, ManifestError};

const DEFAULT_MANIFEST: &str = include_str!("../assets/default-manifest.json");

/// The manifest bundled at build time. It guarantees the tool keeps working
/// with zero network and zero disk cache, at the cost of a possibly stale
/// version list.
#[derive(Debug, Default)]
pub struct EmbeddedSource;

impl EmbeddedSource {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ManifestSource for EmbeddedSource {
    fn name(&self) -> &'static str {
        "embedded"
    }

    async fn fetch_manifest(&self, runtime: &str) -> Result<FetchedManifest, ManifestError> {
        let document = ManifestDocument::from_json(DEFAULT_MANIFEST, "embedded")?;
        Ok(FetchedManifest {
            manifest: document.manifest_for(runtime),
            origin: "embedded",
        })
    }
}
