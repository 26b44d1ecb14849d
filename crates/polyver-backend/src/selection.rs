use std::path::Path;

use polyver_core::SelectionStore;

use crate::error::ProviderError;

/// Per-runtime view over the two-scope selection store, shared by every
/// provider implementation.
#[derive(Debug, Clone)]
pub struct Selections {
    runtime: &'static str,
    store: SelectionStore,
}

impl Selections {
    #[must_use]
    pub fn new(runtime: &'static str, store: SelectionStore) -> Self {
        Self { runtime, store }
    }

    /// # Errors
    /// Returns `ConfigCorrupt` for malformed selection data.
    pub fn global(&self) -> Result<Option<String>, ProviderError> {
        Ok(self.store.global_version(self.runtime)?)
    }

    /// # Errors
    /// Returns an error when the selection cannot be persisted.
    pub fn set_global(&self, version: &str) -> Result<(), ProviderError> {
        self.store.set_global_version(self.runtime, Some(version))?;
        Ok(())
    }

    /// # Errors
    /// Returns `ConfigCorrupt` for malformed selection data.
    pub fn local_from(&self, dir: &Path) -> Result<Option<String>, ProviderError> {
        Ok(self
            .store
            .local_version_from(dir, self.runtime)?
            .map(|(version, _)| version))
    }

    /// # Errors
    /// Returns an error when the selection cannot be persisted.
    pub fn set_local_in(&self, dir: &Path, version: &str) -> Result<(), ProviderError> {
        self.store
            .set_local_version_in(dir, self.runtime, Some(version))?;
        Ok(())
    }

    /// The effective version seen from `dir`; local overrides global.
    ///
    /// # Errors
    /// `NoActiveVersion` when neither scope has a selection.
    pub fn current_from(&self, dir: &Path) -> Result<String, ProviderError> {
        self.store
            .current_version_from(dir, self.runtime)?
            .ok_or(ProviderError::NoActiveVersion {
                runtime: self.runtime,
            })
    }

    /// After an uninstall: unset the global selection and the nearest local
    /// selection (walking from `dir`) when they named the removed version.
    ///
    /// # Errors
    /// Returns an error when a scope file is corrupt or cannot be rewritten.
    pub fn clear_if_selected(&self, dir: &Path, version: &str) -> Result<(), ProviderError> {
        if self.global()?.as_deref() == Some(version) {
            self.store.set_global_version(self.runtime, None)?;
        }
        if self.local_from(dir)?.as_deref() == Some(version) {
            self.store.set_local_version_in(dir, self.runtime, None)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selections(root: &Path) -> Selections {
        Selections::new(
            "node",
            SelectionStore::new(root.join("config/versions.json")),
        )
    }

    #[test]
    fn current_without_any_selection_is_no_active_version() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let sel = selections(temp.path());

        assert!(matches!(
            sel.current_from(temp.path()),
            Err(ProviderError::NoActiveVersion { runtime: "node" })
        ));
    }

    #[test]
    fn local_two_levels_up_overrides_global() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let sel = selections(temp.path());
        let project = temp.path().join("project");
        let work_dir = project.join("src").join("lib");
        std::fs::create_dir_all(&work_dir).unwrap();

        sel.set_global("22.15.1").unwrap();
        sel.set_local_in(&project, "18.19.0").unwrap();

        assert_eq!(sel.current_from(&work_dir).unwrap(), "18.19.0");
    }

    #[test]
    fn clear_if_selected_unsets_matching_scopes_only() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let sel = selections(temp.path());
        let project = temp.path().join("project");
        std::fs::create_dir_all(&project).unwrap();

        sel.set_global("20.10.0").unwrap();
        sel.set_local_in(&project, "22.15.1").unwrap();

        sel.clear_if_selected(&project, "22.15.1").unwrap();
        assert_eq!(sel.local_from(&project).unwrap(), None);
        assert_eq!(sel.global().unwrap().as_deref(), Some("20.10.0"));

        sel.clear_if_selected(&project, "20.10.0").unwrap();
        assert_eq!(sel.global().unwrap(), None);
    }
}
