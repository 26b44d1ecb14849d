use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fsutil::write_atomic;

/// File name of a directory-scoped selection, discovered by upward search.
pub const LOCAL_FILE_NAME: &str = ".polyver.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Corrupt config file {path}: {details}")]
    Corrupt { path: PathBuf, details: String },

    #[error("IO error ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Persisted version selections, one JSON object per scope mapping runtime
/// name to version string.
///
/// Reads are snapshot-per-call; writes go through a temp file and rename so
/// concurrent writers never produce a torn read.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    global_file: PathBuf,
}

impl SelectionStore {
    #[must_use]
    pub fn new(global_file: PathBuf) -> Self {
        Self { global_file }
    }

    /// The machine-wide selection for a runtime, if any.
    ///
    /// # Errors
    /// Returns `ConfigError::Corrupt` for malformed JSON, or an IO error.
    pub fn global_version(&self, runtime: &str) -> Result<Option<String>, ConfigError> {
        Ok(read_scope(&self.global_file)?.and_then(|mut map| map.remove(runtime)))
    }

    /// Set or clear (`None`) the machine-wide selection for a runtime.
    ///
    /// # Errors
    /// Returns an error when the existing file is corrupt or the write fails.
    pub fn set_global_version(
        &self,
        runtime: &str,
        version: Option<&str>,
    ) -> Result<(), ConfigError> {
        update_scope(&self.global_file, runtime, version)
    }

    /// Walk from `dir` to the filesystem root and return the first local
    /// selection for `runtime`, together with the file that declared it.
    ///
    /// # Errors
    /// Returns `ConfigError::Corrupt` if an encountered file is malformed.
    pub fn local_version_from(
        &self,
        dir: &Path,
        runtime: &str,
    ) -> Result<Option<(String, PathBuf)>, ConfigError> {
        for ancestor in dir.ancestors() {
            let file = ancestor.join(LOCAL_FILE_NAME);
            if let Some(mut map) = read_scope(&file)?
                && let Some(version) = map.remove(runtime)
            {
                return Ok(Some((version, file)));
            }
        }
        Ok(None)
    }

    /// Set or clear the local selection. Setting writes `.polyver.json` in
    /// `dir`; clearing edits the nearest ancestor file that declared one.
    ///
    /// # Errors
    /// Returns an error when a scope file is corrupt or the write fails.
    pub fn set_local_version_in(
        &self,
        dir: &Path,
        runtime: &str,
        version: Option<&str>,
    ) -> Result<(), ConfigError> {
        match version {
            Some(version) => update_scope(&dir.join(LOCAL_FILE_NAME), runtime, Some(version)),
            None => {
                if let Some((_, file)) = self.local_version_from(dir, runtime)? {
                    update_scope(&file, runtime, None)?;
                }
                Ok(())
            }
        }
    }

    /// The effective selection seen from `dir`: the first ancestor local
    /// selection wins; otherwise the global selection applies.
    ///
    /// # Errors
    /// Returns `ConfigError::Corrupt` for malformed scope data.
    pub fn current_version_from(
        &self,
        dir: &Path,
        runtime: &str,
    ) -> Result<Option<String>, ConfigError> {
        if let Some((version, _)) = self.local_version_from(dir, runtime)? {
            return Ok(Some(version));
        }
        self.global_version(runtime)
    }
}

fn read_scope(path: &Path) -> Result<Option<BTreeMap<String, String>>, ConfigError> {
    let data = match std::fs::read_to_string(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    serde_json::from_str(&data)
        .map(Some)
        .map_err(|err| ConfigError::Corrupt {
            path: path.to_path_buf(),
            details: err.to_string(),
        })
}

fn update_scope(path: &Path, runtime: &str, version: Option<&str>) -> Result<(), ConfigError> {
    let mut map = read_scope(path)?.unwrap_or_default();
    match version {
        Some(version) => {
            map.insert(runtime.to_string(), version.to_string());
        }
        None => {
            map.remove(runtime);
        }
    }

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let data = serde_json::to_vec_pretty(&map).map_err(|err| ConfigError::Corrupt {
        path: path.to_path_buf(),
        details: err.to_string(),
    })?;
    write_atomic(path, &data)?;
    Ok(())
}
