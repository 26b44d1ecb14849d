use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use polyver_backend::{
    AvailableVersion, DetectedInstallation, InstalledVersion, Provider, ProviderError,
    RuntimeDirs, RuntimeHandle, Selections,
};
use polyver_core::{SelectionStore, current_platform, is_windows_platform};
use polyver_manifest::ManifestSource;

use crate::packages;

const RUNTIME: &str = "python";
const SHIMS: &[&str] = &["python", "python3", "pip", "pip3"];

pub struct PythonProvider {
    handle: RuntimeHandle,
}

impl PythonProvider {
    #[must_use]
    pub fn new(
        installs_root: PathBuf,
        store: SelectionStore,
        source: Arc<dyn ManifestSource>,
    ) -> Self {
        Self {
            handle: RuntimeHandle::new(
                RUNTIME,
                RuntimeDirs::new(RUNTIME, installs_root),
                Selections::new(RUNTIME, store),
                source,
            ),
        }
    }

    fn executable_in(root: &Path) -> PathBuf {
        if is_windows_platform(current_platform()) {
            root.join("python.exe")
        } else {
            root.join("bin").join("python3")
        }
    }

    /// Verify the interpreter landed where the archive layout promises, and
    /// on Unix make sure a bare `python` name exists alongside `python3`.
    fn finish_layout(root: &Path) -> Result<(), ProviderError> {
        let exe = Self::executable_in(root);
        if !exe.is_file() {
            return Err(ProviderError::install_failed(
                "post-install",
                format!("extracted archive has no interpreter at {}", exe.display()),
            ));
        }

        #[cfg(unix)]
        {
            let bare = root.join("bin").join("python");
            if !bare.exists() {
                std::os::unix::fs::symlink("python3", &bare).map_err(|err| {
                    ProviderError::install_failed(
                        "post-install",
                        format!("failed to link python -> python3: {err}"),
                    )
                })?;
            }
        }

        Ok(())
    }
}

#[async_trait]
impl Provider for PythonProvider {
    fn name(&self) -> &'static str {
        RUNTIME
    }

    fn display_name(&self) -> &'static str {
        "Python"
    }

    fn shims(&self) -> &'static [&'static str] {
        SHIMS
    }

    async fn list_available(&self) -> Result<Vec<AvailableVersion>, ProviderError> {
        self.handle.available_versions().await
    }

    fn list_installed(&self) -> Result<Vec<InstalledVersion>, ProviderError> {
        self.handle.dirs().list_installed()
    }

    async fn install(&self, version: &str) -> Result<(), ProviderError> {
        self.handle.install(version, &Self::finish_layout).await
    }

    fn uninstall(&self, version: &str) -> Result<(), ProviderError> {
        self.handle.uninstall(version, &std::env::current_dir()?)
    }

    fn is_installed(&self, version: &str) -> Result<bool, ProviderError> {
        Ok(self.handle.dirs().is_installed(version))
    }

    fn install_path(&self, version: &str) -> Result<PathBuf, ProviderError> {
        if !self.handle.dirs().is_installed(version) {
            return Err(ProviderError::NotInstalled {
                version: version.to_string(),
            });
        }
        Ok(self.handle.dirs().install_dir(version))
    }

    fn executable_path(&self, version: &str) -> Result<PathBuf, ProviderError> {
        Ok(Self::executable_in(&self.install_path(version)?))
    }

    fn global_version(&self) -> Result<Option<String>, ProviderError> {
        self.handle.selections().global()
    }

    fn set_global_version(&self, version: &str) -> Result<(), ProviderError> {
        self.handle.selections().set_global(version)
    }

    fn local_version(&self) -> Result<Option<String>, ProviderError> {
        self.handle
            .selections()
            .local_from(&std::env::current_dir()?)
    }

    fn set_local_version(&self, version: &str) -> Result<(), ProviderError> {
        self.handle
            .selections()
            .set_local_in(&std::env::current_dir()?, version)
    }

    fn current_version(&self) -> Result<String, ProviderError> {
        self.current_version_from(&std::env::current_dir()?)
    }

    fn current_version_from(&self, dir: &Path) -> Result<String, ProviderError> {
        self.handle.selections().current_from(dir)
    }

    fn environment(&self, version: &str) -> Result<HashMap<String, String>, ProviderError> {
        // Relocatable builds find their own stdlib relative to the binary;
        // forcing PYTHONHOME here would break virtual environments.
        self.install_path(version)?;
        Ok(HashMap::new())
    }

    fn detect_installed(&self) -> Vec<DetectedInstallation> {
        let mut found = Vec::new();

        if let Some(home) = dirs::home_dir()
            && let Ok(entries) = std::fs::read_dir(home.join(".pyenv/versions"))
        {
            for entry in entries.flatten() {
                if !entry.path().is_dir() {
                    continue;
                }
                if let Some(name) = entry.file_name().to_str() {
                    found.push(DetectedInstallation {
                        manager: "pyenv".to_string(),
                        version: Some(name.to_string()),
                        path: entry.path(),
                    });
                }
            }
        }

        if let Ok(path) = which::which("python3") {
            found.push(DetectedInstallation {
                manager: "system".to_string(),
                version: None,
                path,
            });
        }

        found
    }

    fn global_packages(&self, install_path: &Path) -> Result<Vec<String>, ProviderError> {
        packages::installed_packages(install_path)
    }

    fn manual_package_install_command(&self, packages: &[String]) -> String {
        if packages.is_empty() {
            String::new()
        } else {
            format!("pip install {}", packages.join(" "))
        }
    }

    fn should_reshim_after(&self, shim: &str, args: &[String]) -> bool {
        matches!(shim, "pip" | "pip3")
            && args
                .first()
                .is_some_and(|a| a == "install" || a == "uninstall")
    }
}
