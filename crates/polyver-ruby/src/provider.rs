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

const RUNTIME: &str = "ruby";
const SHIMS: &[&str] = &["ruby", "gem", "bundle", "bundler", "irb", "rake"];

/// Gems bundled with every Ruby distribution, excluded from migration
/// reports.
const BUNDLED_GEMS: &[&str] = &["bundler", "rake", "irb", "rdoc"];

/// Directory inside each installation that holds user-installed gems,
/// pointed at by `GEM_HOME` during dispatch so gems never leak between
/// versions.
const GEM_HOME_DIR: &str = "gems";

pub struct RubyProvider {
    handle: RuntimeHandle,
}

impl RubyProvider {
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
            root.join("bin").join("ruby.exe")
        } else {
            root.join("bin").join("ruby")
        }
    }

    /// Verify the interpreter and pre-create the per-installation gem home
    /// so the first `gem install` does not race to create it.
    fn finish_layout(root: &Path) -> Result<(), ProviderError> {
        let exe = Self::executable_in(root);
        if !exe.is_file() {
            return Err(ProviderError::install_failed(
                "post-install",
                format!("extracted archive has no interpreter at {}", exe.display()),
            ));
        }
        std::fs::create_dir_all(root.join(GEM_HOME_DIR))?;
        Ok(())
    }

    /// Strip the trailing `-<version>` from a gem directory name.
    fn gem_name(dir_name: &str) -> Option<&str> {
        let (name, version) = dir_name.rsplit_once('-')?;
        version
            .chars()
            .next()
            .filter(char::is_ascii_digit)
            .map(|_| name)
    }
}

#[async_trait]
impl Provider for RubyProvider {
    fn name(&self) -> &'static str {
        RUNTIME
    }

    fn display_name(&self) -> &'static str {
        "Ruby"
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
        let gem_home = self.install_path(version)?.join(GEM_HOME_DIR);
        let gem_home = gem_home.to_string_lossy().into_owned();
        Ok(HashMap::from([
            ("GEM_HOME".to_string(), gem_home.clone()),
            ("GEM_PATH".to_string(), gem_home),
        ]))
    }

    fn detect_installed(&self) -> Vec<DetectedInstallation> {
        let mut found = Vec::new();

        if let Some(home) = dirs::home_dir() {
            for (root, manager) in [
                (home.join(".rbenv/versions"), "rbenv"),
                (home.join(".rvm/rubies"), "rvm"),
            ] {
                let Ok(entries) = std::fs::read_dir(root) else {
                    continue;
                };
                for entry in entries.flatten() {
                    if !entry.path().is_dir() {
                        continue;
                    }
                    if let Some(name) = entry.file_name().to_str() {
                        found.push(DetectedInstallation {
                            manager: manager.to_string(),
                            version: Some(name.trim_start_matches("ruby-").to_string()),
                            path: entry.path(),
                        });
                    }
                }
            }
        }

        if let Ok(path) = which::which("ruby") {
            found.push(DetectedInstallation {
                manager: "system".to_string(),
                version: None,
                path,
            });
        }

        found
    }

    fn global_packages(&self, install_path: &Path) -> Result<Vec<String>, ProviderError> {
        let gems_dir = install_path.join(GEM_HOME_DIR).join("gems");
        let entries = match std::fs::read_dir(&gems_dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut packages = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.path().is_dir() {
                continue;
            }
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(gem) = Self::gem_name(name)
                && !BUNDLED_GEMS.contains(&gem)
            {
                packages.push(gem.to_string());
            }
        }

        packages.sort();
        packages.dedup();
        Ok(packages)
    }

    fn manual_package_install_command(&self, packages: &[String]) -> String {
        if packages.is_empty() {
            String::new()
        } else {
            format!("gem install {}", packages.join(" "))
        }
    }

    fn should_reshim_after(&self, shim: &str, args: &[String]) -> bool {
        shim == "gem"
            && args
                .first()
                .is_some_and(|a| a == "install" || a == "uninstall")
    }
}
