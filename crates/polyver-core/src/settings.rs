use serde::{Deserialize, Serialize};
use std::path::Path;

/// How the shims directory was made discoverable on PATH.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallType {
    /// System PATH (requires elevation on Windows).
    #[default]
    System,
    /// User PATH (no elevation; system runtimes may shadow shims).
    User,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub install_type: InstallType,
}

impl Settings {
    /// Load settings, defaulting to a system install when the file does not
    /// exist or holds an unrecognized value.
    ///
    /// # Errors
    /// Returns an IO error for anything other than a missing file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => return Err(err),
        };

        Ok(serde_json::from_str(&data).unwrap_or_else(|err| {
            log::warn!("Unrecognized settings in {}: {err}; using defaults", path.display());
            Self::default()
        }))
    }

    /// Persist settings, creating the parent directory if needed.
    ///
    /// # Errors
    /// Returns an IO error if the directory or file cannot be written.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_defaults_to_system_install() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let settings = Settings::load(&temp.path().join("settings.json")).unwrap();
        assert_eq!(settings.install_type, InstallType::System);
    }

    #[test]
    fn save_then_load_preserves_install_type() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp.path().join("config").join("settings.json");

        Settings {
            install_type: InstallType::User,
        }
        .save(&path)
        .unwrap();

        let loaded = Settings::load(&path).unwrap();
        assert_eq!(loaded.install_type, InstallType::User);
    }

    #[test]
    fn unrecognized_value_falls_back_to_default() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let path = temp.path().join("settings.json");
        std::fs::write(&path, r#"{"install_type":"kiosk"}"#).unwrap();

        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.install_type, InstallType::System);
    }
}
