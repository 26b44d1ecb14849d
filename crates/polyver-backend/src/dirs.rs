use std::path::PathBuf;

use polyver_core::Version;

use crate::error::ProviderError;
use crate::traits::InstalledVersion;

/// Marker file written into a staged install directory immediately before
/// the atomic rename. A directory without it is a leftover partial install
/// and is never reported as installed.
pub const COMPLETE_MARKER: &str = ".polyver-complete";

/// Install-directory bookkeeping for one runtime. The directory tree is the
/// only index of installed versions; there is no database to desynchronize.
#[derive(Debug, Clone)]
pub struct RuntimeDirs {
    runtime: &'static str,
    root: PathBuf,
}

impl RuntimeDirs {
    #[must_use]
    pub fn new(runtime: &'static str, root: PathBuf) -> Self {
        Self { runtime, root }
    }

    #[must_use]
    pub fn runtime(&self) -> &'static str {
        self.runtime
    }

    #[must_use]
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    #[must_use]
    pub fn install_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    #[must_use]
    pub fn is_installed(&self, version: &str) -> bool {
        self.install_dir(version).join(COMPLETE_MARKER).is_file()
    }

    /// Enumerate completed installs, ascending by version. Directories with
    /// unparsable names or no completion marker are skipped.
    ///
    /// # Errors
    /// Returns an IO error when the runtime root exists but cannot be read.
    pub fn list_installed(&self) -> Result<Vec<InstalledVersion>, ProviderError> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut installed = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !self.is_installed(name) {
                continue;
            }
            match name.parse::<Version>() {
                Ok(version) => installed.push(InstalledVersion {
                    version,
                    install_root: entry.path(),
                }),
                Err(err) => {
                    log::warn!(
                        "Ignoring {} install directory with unparsable name {name:?}: {err}",
                        self.runtime
                    );
                }
            }
        }

        installed.sort_by(|a, b| a.version.cmp(&b.version));
        Ok(installed)
    }

    /// Remove an installed version's directory.
    ///
    /// # Errors
    /// `NotInstalled` when the version is absent.
    pub fn remove(&self, version: &str) -> Result<(), ProviderError> {
        if !self.is_installed(version) {
            return Err(ProviderError::NotInstalled {
                version: version.to_string(),
            });
        }
        std::fs::remove_dir_all(self.install_dir(version))?;
        Ok(())
    }
}
