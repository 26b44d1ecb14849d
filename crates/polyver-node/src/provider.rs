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

use crate::detection::detect_node_installations;
use crate::packages;

const RUNTIME: &str = "node";
const SHIMS: &[&str] = &["node", "npm", "npx", "corepack"];

pub struct NodeProvider {
    handle: RuntimeHandle,
}

impl NodeProvider {
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
            root.join("node.exe")
        } else {
            root.join("bin").join("node")
        }
    }

    /// Official archives place the interpreter at a fixed location; anything
    /// else means the download was not a Node.js distribution.
    fn verify_layout(root: &Path) -> Result<(), ProviderError> {
        let exe = Self::executable_in(root);
        if exe.is_file() {
            Ok(())
        } else {
            Err(ProviderError::install_failed(
                "post-install",
                format!("extracted archive has no interpreter at {}", exe.display()),
            ))
        }
    }
}

#[async_trait]
impl Provider for NodeProvider {
    fn name(&self) -> &'static str {
        RUNTIME
    }

    fn display_name(&self) -> &'static str {
        "Node.js"
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
        self.handle.install(version, &Self::verify_layout).await
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
        // Node needs nothing beyond PATH, which dispatch handles.
        self.install_path(version)?;
        Ok(HashMap::new())
    }

    fn detect_installed(&self) -> Vec<DetectedInstallation> {
        detect_node_installations()
    }

    fn global_packages(&self, install_path: &Path) -> Result<Vec<String>, ProviderError> {
        packages::global_packages(install_path)
    }

    fn manual_package_install_command(&self, packages: &[String]) -> String {
        if packages.is_empty() {
            String::new()
        } else {
            format!("npm install -g {}", packages.join(" "))
        }
    }

    fn should_reshim_after(&self, shim: &str, args: &[String]) -> bool {
        match shim {
            "npm" => {
                let global = args.iter().any(|a| a == "-g" || a == "--global");
                global
                    && args.iter().any(|a| {
                        matches!(a.as_str(), "install" | "i" | "uninstall" | "remove" | "rm" | "un")
                    })
            }
            "corepack" => args.first().is_some_and(|a| a == "enable" || a == "disable"),
            _ => false,
        }
    }
}
