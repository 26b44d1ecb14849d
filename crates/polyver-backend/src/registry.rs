use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::traits::Provider;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Runtime {name:?} is registered twice")]
    DuplicateRuntime { name: &'static str },

    #[error("Shim {shim:?} is claimed by both {first:?} and {second:?}")]
    DuplicateShim {
        shim: &'static str,
        first: &'static str,
        second: &'static str,
    },
}

/// Collects providers at process start. Duplicate runtime names or shim
/// names are configuration bugs and abort registration.
#[derive(Default)]
pub struct RegistryBuilder {
    providers: Vec<Arc<dyn Provider>>,
}

impl RegistryBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns a `RegistryError` for a duplicate runtime or shim name.
    pub fn register(mut self, provider: Arc<dyn Provider>) -> Result<Self, RegistryError> {
        for existing in &self.providers {
            if existing.name() == provider.name() {
                return Err(RegistryError::DuplicateRuntime {
                    name: provider.name(),
                });
            }
            for shim in provider.shims() {
                if existing.shims().contains(shim) {
                    return Err(RegistryError::DuplicateShim {
                        shim,
                        first: existing.name(),
                        second: provider.name(),
                    });
                }
            }
        }
        self.providers.push(provider);
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> ProviderRegistry {
        let mut by_name = HashMap::new();
        let mut by_shim = HashMap::new();
        for (index, provider) in self.providers.iter().enumerate() {
            by_name.insert(provider.name(), index);
            for shim in provider.shims() {
                by_shim.insert(*shim, index);
            }
        }
        ProviderRegistry {
            providers: self.providers,
            by_name,
            by_shim,
        }
    }
}

/// The process-wide set of runtime providers, constructed once at startup
/// and immutable thereafter. Passed by reference to the resolver, the
/// dispatcher, and the command layer.
pub struct ProviderRegistry {
    providers: Vec<Arc<dyn Provider>>,
    by_name: HashMap<&'static str, usize>,
    by_shim: HashMap<&'static str, usize>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn get(&self, runtime: &str) -> Option<&Arc<dyn Provider>> {
        self.by_name.get(runtime).map(|&index| &self.providers[index])
    }

    /// The provider owning a shim name, if any.
    #[must_use]
    pub fn by_shim(&self, shim: &str) -> Option<&Arc<dyn Provider>> {
        self.by_shim.get(shim).map(|&index| &self.providers[index])
    }

    /// Providers in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }

    #[must_use]
    pub fn runtime_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Every shim name across all providers, in registration order.
    #[must_use]
    pub fn all_shims(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .flat_map(|p| p.shims().iter().copied())
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::error::ProviderError;
    use crate::traits::{AvailableVersion, InstalledVersion};

    struct StubProvider {
        name: &'static str,
        shims: &'static [&'static str],
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &'static str {
            self.name
        }

        fn display_name(&self) -> &'static str {
            self.name
        }

        fn shims(&self) -> &'static [&'static str] {
            self.shims
        }

        async fn list_available(&self) -> Result<Vec<AvailableVersion>, ProviderError> {
            Ok(Vec::new())
        }

        fn list_installed(&self) -> Result<Vec<InstalledVersion>, ProviderError> {
            Ok(Vec::new())
        }

        async fn install(&self, _version: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        fn uninstall(&self, _version: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        fn is_installed(&self, _version: &str) -> Result<bool, ProviderError> {
            Ok(false)
        }

        fn install_path(&self, version: &str) -> Result<PathBuf, ProviderError> {
            Err(ProviderError::NotInstalled {
                version: version.to_string(),
            })
        }

        fn executable_path(&self, version: &str) -> Result<PathBuf, ProviderError> {
            Err(ProviderError::NotInstalled {
                version: version.to_string(),
            })
        }

        fn global_version(&self) -> Result<Option<String>, ProviderError> {
            Ok(None)
        }

        fn set_global_version(&self, _version: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        fn local_version(&self) -> Result<Option<String>, ProviderError> {
            Ok(None)
        }

        fn set_local_version(&self, _version: &str) -> Result<(), ProviderError> {
            Ok(())
        }

        fn current_version(&self) -> Result<String, ProviderError> {
            Err(ProviderError::NoActiveVersion { runtime: self.name })
        }

        fn current_version_from(&self, _dir: &Path) -> Result<String, ProviderError> {
            Err(ProviderError::NoActiveVersion { runtime: self.name })
        }

        fn environment(&self, _version: &str) -> Result<HashMap<String, String>, ProviderError> {
            Ok(HashMap::new())
        }

        fn global_packages(&self, _install_path: &Path) -> Result<Vec<String>, ProviderError> {
            Ok(Vec::new())
        }

        fn manual_package_install_command(&self, _packages: &[String]) -> String {
            String::new()
        }

        fn should_reshim_after(&self, _shim: &str, _args: &[String]) -> bool {
            false
        }
    }

    fn stub(name: &'static str, shims: &'static [&'static str]) -> Arc<dyn Provider> {
        Arc::new(StubProvider { name, shims })
    }

    #[test]
    fn lookup_by_name_and_by_shim() {
        let registry = RegistryBuilder::new()
            .register(stub("node", &["node", "npm"]))
            .unwrap()
            .register(stub("ruby", &["ruby", "gem"]))
            .unwrap()
            .build();

        assert_eq!(registry.get("node").unwrap().name(), "node");
        assert_eq!(registry.by_shim("gem").unwrap().name(), "ruby");
        assert!(registry.by_shim("cargo").is_none());
        assert_eq!(registry.runtime_names(), ["node", "ruby"]);
        assert_eq!(registry.all_shims(), ["node", "npm", "ruby", "gem"]);
    }

    #[test]
    fn duplicate_runtime_name_is_rejected() {
        let result = RegistryBuilder::new()
            .register(stub("node", &["node"]))
            .unwrap()
            .register(stub("node", &["nodejs"]));

        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateRuntime { name: "node" })
        );
    }

    #[test]
    fn duplicate_shim_across_providers_is_rejected() {
        let result = RegistryBuilder::new()
            .register(stub("node", &["node", "npx"]))
            .unwrap()
            .register(stub("deno", &["deno", "npx"]));

        assert_eq!(
            result.err(),
            Some(RegistryError::DuplicateShim {
                shim: "npx",
                first: "node",
                second: "deno",
            })
        );
    }
}
