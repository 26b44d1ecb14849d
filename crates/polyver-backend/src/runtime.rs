use std::path::Path;
use std::sync::Arc;

use polyver_core::current_platform;
use polyver_manifest::{DownloadDescriptor, ManifestSource};

use crate::dirs::RuntimeDirs;
use crate::error::ProviderError;
use crate::install::install_from_descriptor;
use crate::selection::Selections;
use crate::traits::AvailableVersion;

/// The plumbing every provider shares: install directories, the two-scope
/// selection store, and the manifest chain. Providers compose a handle and
/// layer runtime-specific layout, environment, and package knowledge on top.
pub struct RuntimeHandle {
    runtime: &'static str,
    dirs: RuntimeDirs,
    selections: Selections,
    source: Arc<dyn ManifestSource>,
}

impl RuntimeHandle {
    #[must_use]
    pub fn new(
        runtime: &'static str,
        dirs: RuntimeDirs,
        selections: Selections,
        source: Arc<dyn ManifestSource>,
    ) -> Self {
        Self {
            runtime,
            dirs,
            selections,
            source,
        }
    }

    #[must_use]
    pub fn runtime(&self) -> &'static str {
        self.runtime
    }

    #[must_use]
    pub fn dirs(&self) -> &RuntimeDirs {
        &self.dirs
    }

    #[must_use]
    pub fn selections(&self) -> &Selections {
        &self.selections
    }

    /// All versions the manifest chain knows for the current platform,
    /// ascending, each tagged with the chain layer that produced it.
    ///
    /// # Errors
    /// `SourceUnavailable` when every layer of the chain failed.
    pub async fn available_versions(&self) -> Result<Vec<AvailableVersion>, ProviderError> {
        let fetched = self
            .source
            .fetch_manifest(self.runtime)
            .await
            .map_err(|err| ProviderError::source_unavailable(self.runtime, &err))?;

        let mut versions: Vec<AvailableVersion> = fetched
            .manifest
            .versions_for_platform(current_platform())
            .into_iter()
            .map(|version| AvailableVersion {
                version,
                source: fetched.origin,
            })
            .collect();
        versions.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(versions)
    }

    /// The download descriptor for an exact version on the current platform.
    ///
    /// # Errors
    /// `VersionNotFound` when the manifest has no artifact for this platform,
    /// `SourceUnavailable` when the chain is exhausted.
    pub async fn descriptor_for(&self, version: &str) -> Result<DownloadDescriptor, ProviderError> {
        let fetched = self
            .source
            .fetch_manifest(self.runtime)
            .await
            .map_err(|err| ProviderError::source_unavailable(self.runtime, &err))?;

        fetched
            .manifest
            .descriptor(version, current_platform())
            .cloned()
            .ok_or_else(|| ProviderError::VersionNotFound {
                runtime: self.runtime,
                version: version.to_string(),
                platform: current_platform().to_string(),
            })
    }

    /// Install an exact version through the shared pipeline, running the
    /// provider's post-install hook against the staged root before the
    /// activating rename.
    ///
    /// # Errors
    /// `AlreadyInstalled` for a present version, plus everything the install
    /// pipeline can raise.
    pub async fn install(
        &self,
        version: &str,
        post_install: &(dyn Fn(&Path) -> Result<(), ProviderError> + Sync),
    ) -> Result<(), ProviderError> {
        if self.dirs.is_installed(version) {
            return Err(ProviderError::AlreadyInstalled {
                version: version.to_string(),
            });
        }

        let descriptor = self.descriptor_for(version).await?;
        log::info!(
            "Installing {} {version} from {}",
            self.runtime,
            descriptor.url
        );
        install_from_descriptor(&descriptor, &self.dirs.install_dir(version), post_install).await
    }

    /// Remove an installed version and drop any selection that named it,
    /// walking local scopes up from `dir`.
    ///
    /// # Errors
    /// `NotInstalled` when the version is absent.
    pub fn uninstall(&self, version: &str, dir: &Path) -> Result<(), ProviderError> {
        self.dirs.remove(version)?;
        self.selections.clear_if_selected(dir, version)?;
        log::info!("Uninstalled {} {version}", self.runtime);
        Ok(())
    }
}
