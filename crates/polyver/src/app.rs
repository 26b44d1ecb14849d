use std::sync::Arc;

use polyver_backend::{Provider, ProviderRegistry, RegistryBuilder, RegistryError};
use polyver_core::{AppPaths, SelectionStore};
use polyver_manifest::{ManifestSource, default_chain};
use polyver_node::NodeProvider;
use polyver_python::PythonProvider;
use polyver_ruby::RubyProvider;

use crate::error::CliError;

/// Everything a command needs: the directory layout and the provider
/// registry. Construction does no IO beyond resolving base directories.
pub struct App {
    pub paths: AppPaths,
    pub registry: ProviderRegistry,
}

impl App {
    pub fn bootstrap() -> Result<Self, CliError> {
        let paths = AppPaths::new()?;
        let registry = build_registry(&paths, default_chain())?;
        Ok(Self { paths, registry })
    }

    /// Look up a provider by the runtime name the user typed.
    pub fn provider(&self, runtime: &str) -> Result<&Arc<dyn Provider>, CliError> {
        self.registry
            .get(runtime)
            .ok_or_else(|| CliError::UnknownRuntime(runtime.to_string()))
    }
}

pub fn build_registry(
    paths: &AppPaths,
    source: Arc<dyn ManifestSource>,
) -> Result<ProviderRegistry, RegistryError> {
    let store = SelectionStore::new(paths.global_versions_file());

    Ok(RegistryBuilder::new()
        .register(Arc::new(NodeProvider::new(
            paths.runtime_installs_dir("node"),
            store.clone(),
            Arc::clone(&source),
        )))?
        .register(Arc::new(PythonProvider::new(
            paths.runtime_installs_dir("python"),
            store.clone(),
            Arc::clone(&source),
        )))?
        .register(Arc::new(RubyProvider::new(
            paths.runtime_installs_dir("ruby"),
            store,
            source,
        )))?
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyver_manifest::EmbeddedSource;
    use std::path::Path;

    fn registry(root: &Path) -> ProviderRegistry {
        let paths = AppPaths {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        };
        build_registry(&paths, Arc::new(EmbeddedSource::new())).unwrap()
    }

    #[test]
    fn all_three_runtimes_register_without_shim_collisions() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let registry = registry(temp.path());

        assert_eq!(registry.runtime_names(), ["node", "python", "ruby"]);
        assert!(registry.by_shim("node").is_some());
        assert!(registry.by_shim("pip3").is_some());
        assert!(registry.by_shim("bundler").is_some());
        assert!(registry.by_shim("cargo").is_none());
    }
}
