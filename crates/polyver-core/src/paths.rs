use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AppPathsError {
    #[error("Could not determine home directory")]
    HomeDirUnavailable,
    #[error("Could not determine config directory")]
    ConfigDirUnavailable,
    #[error("Could not determine cache directory")]
    CacheDirUnavailable,
    #[error("Could not determine data directory")]
    DataDirUnavailable,
}

/// Well-known directory layout for the current user.
///
/// The data directory is the only multi-writer resource: it holds one
/// subdirectory per installed runtime version plus the shims directory.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Build application paths for the current platform.
    ///
    /// # Errors
    /// Returns an error when a required base directory cannot be determined.
    pub fn new() -> Result<Self, AppPathsError> {
        #[cfg(target_os = "macos")]
        {
            let home = dirs::home_dir().ok_or(AppPathsError::HomeDirUnavailable)?;
            Ok(Self {
                config_dir: home.join("Library/Application Support/polyver"),
                cache_dir: home.join("Library/Caches/polyver"),
                data_dir: home.join("Library/Application Support/polyver"),
            })
        }

        #[cfg(not(target_os = "macos"))]
        {
            Ok(Self {
                config_dir: dirs::config_dir()
                    .ok_or(AppPathsError::ConfigDirUnavailable)?
                    .join("polyver"),
                cache_dir: dirs::cache_dir()
                    .ok_or(AppPathsError::CacheDirUnavailable)?
                    .join("polyver"),
                data_dir: dirs::data_dir()
                    .ok_or(AppPathsError::DataDirUnavailable)?
                    .join("polyver"),
            })
        }
    }

    #[must_use]
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    #[must_use]
    pub fn global_versions_file(&self) -> PathBuf {
        self.config_dir.join("versions.json")
    }

    #[must_use]
    pub fn manifest_cache_dir(&self) -> PathBuf {
        self.cache_dir.join("manifests")
    }

    #[must_use]
    pub fn installs_dir(&self) -> PathBuf {
        self.data_dir.join("installs")
    }

    /// Installation root for one runtime, e.g. `installs/node`.
    #[must_use]
    pub fn runtime_installs_dir(&self, runtime: &str) -> PathBuf {
        self.installs_dir().join(runtime)
    }

    #[must_use]
    pub fn shims_dir(&self) -> PathBuf {
        self.data_dir.join("shims")
    }

    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("debug.log")
    }

    /// Ensure all application directories exist on disk.
    ///
    /// # Errors
    /// Returns an error if any directory cannot be created.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(self.manifest_cache_dir())?;
        std::fs::create_dir_all(self.installs_dir())?;
        std::fs::create_dir_all(self.shims_dir())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::AppPaths;

    fn test_paths(root: &std::path::Path) -> AppPaths {
        AppPaths {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        }
    }

    #[test]
    fn file_paths_use_expected_filenames() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let paths = test_paths(temp.path());

        assert!(paths.settings_file().ends_with("config/settings.json"));
        assert!(paths.global_versions_file().ends_with("config/versions.json"));
        assert!(paths.manifest_cache_dir().ends_with("cache/manifests"));
        assert!(
            paths
                .runtime_installs_dir("node")
                .ends_with("data/installs/node")
        );
        assert!(paths.shims_dir().ends_with("data/shims"));
    }

    #[test]
    fn ensure_dirs_creates_the_whole_tree() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let paths = test_paths(temp.path());

        paths
            .ensure_dirs()
            .expect("ensure_dirs should create application directories");

        assert!(paths.config_dir.is_dir());
        assert!(paths.manifest_cache_dir().is_dir());
        assert!(paths.installs_dir().is_dir());
        assert!(paths.shims_dir().is_dir());
    }
}
