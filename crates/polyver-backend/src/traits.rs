use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use polyver_core::Version;

use crate::error::ProviderError;

/// A version known to the manifest chain, with the source layer that
/// produced it. Transient; never persisted.
#[derive(Debug, Clone)]
pub struct AvailableVersion {
    pub version: Version,
    pub source: &'static str,
}

/// A version present on disk. The filesystem is the index: one of these
/// exists exactly as long as its fully-extracted installation root does.
#[derive(Debug, Clone)]
pub struct InstalledVersion {
    pub version: Version,
    pub install_root: PathBuf,
}

/// A best-effort sighting of a runtime installed by some other tool, used
/// only during explicit migration flows.
#[derive(Debug, Clone)]
pub struct DetectedInstallation {
    /// The tool that owns the installation, e.g. `nvm` or `system`.
    pub manager: String,
    pub version: Option<String>,
    pub path: PathBuf,
}

/// The per-runtime capability contract. Exactly one implementation per
/// supported runtime is registered at startup; adding a runtime means
/// implementing this trait, with no change to resolver, dispatcher, or
/// manifest-chain code.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// The fixed set of executable names this provider owns. Names must be
    /// unique across all registered providers.
    fn shims(&self) -> &'static [&'static str];

    /// All versions the manifest chain knows for the current platform.
    ///
    /// # Errors
    /// Returns `SourceUnavailable` only when every layer of the chain failed.
    async fn list_available(&self) -> Result<Vec<AvailableVersion>, ProviderError>;

    /// Versions on disk, ascending. A version counts as installed iff its
    /// directory exists and carries the completed-install marker.
    ///
    /// # Errors
    /// Returns an IO error if the installation root cannot be enumerated.
    fn list_installed(&self) -> Result<Vec<InstalledVersion>, ProviderError>;

    /// Download, verify, extract, and atomically activate a version.
    ///
    /// # Errors
    /// `VersionNotFound` when the manifest has no descriptor for the current
    /// platform, `AlreadyInstalled` for a present version, `ChecksumMismatch`
    /// on a failed verification, and install-phase errors otherwise.
    async fn install(&self, version: &str) -> Result<(), ProviderError>;

    /// Remove an installed version. Clears the global selection and the
    /// nearest local selection when they named the removed version.
    ///
    /// # Errors
    /// `NotInstalled` when the version is absent.
    fn uninstall(&self, version: &str) -> Result<(), ProviderError>;

    /// # Errors
    /// Returns an IO error if the install directory cannot be inspected.
    fn is_installed(&self, version: &str) -> Result<bool, ProviderError>;

    /// # Errors
    /// `NotInstalled` when the version is absent.
    fn install_path(&self, version: &str) -> Result<PathBuf, ProviderError>;

    /// The real interpreter binary for an installed version.
    ///
    /// # Errors
    /// `NotInstalled` when the version is absent.
    fn executable_path(&self, version: &str) -> Result<PathBuf, ProviderError>;

    /// # Errors
    /// Returns `ConfigCorrupt` for malformed selection data.
    fn global_version(&self) -> Result<Option<String>, ProviderError>;

    /// # Errors
    /// Returns an error when the selection cannot be persisted.
    fn set_global_version(&self, version: &str) -> Result<(), ProviderError>;

    /// # Errors
    /// Returns `ConfigCorrupt` for malformed selection data.
    fn local_version(&self) -> Result<Option<String>, ProviderError>;

    /// # Errors
    /// Returns an error when the selection cannot be persisted.
    fn set_local_version(&self, version: &str) -> Result<(), ProviderError>;

    /// The effective version seen from the current working directory
    /// (local selection overrides global).
    ///
    /// # Errors
    /// `NoActiveVersion` when neither scope has a selection.
    fn current_version(&self) -> Result<String, ProviderError>;

    /// Like `current_version`, resolved from an explicit directory.
    ///
    /// # Errors
    /// `NoActiveVersion` when neither scope has a selection.
    fn current_version_from(&self, dir: &Path) -> Result<String, ProviderError>;

    /// Provider-declared environment augmentation merged into the inherited
    /// environment at dispatch time.
    ///
    /// # Errors
    /// `NotInstalled` when the version is absent.
    fn environment(&self, version: &str) -> Result<HashMap<String, String>, ProviderError>;

    /// Best-effort discovery of installations made by other tools. Advisory;
    /// failures are reported as an empty list.
    fn detect_installed(&self) -> Vec<DetectedInstallation> {
        Vec::new()
    }

    /// User-level packages inside an installation, for migration reporting.
    ///
    /// # Errors
    /// Returns an IO error if the installation cannot be inspected.
    fn global_packages(&self, install_path: &Path) -> Result<Vec<String>, ProviderError>;

    /// A shell command the user can run to re-install packages after
    /// migrating. An empty package list yields an empty string.
    fn manual_package_install_command(&self, packages: &[String]) -> String;

    /// Whether running `shim` with `args` may have changed the set of
    /// executables this provider should expose, requiring regeneration.
    fn should_reshim_after(&self, shim: &str, args: &[String]) -> bool;
}
