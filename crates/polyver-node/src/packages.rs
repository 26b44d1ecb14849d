use std::path::Path;

use polyver_backend::ProviderError;
use polyver_core::{current_platform, is_windows_platform};

/// Packages that ship with every Node.js distribution and should not be
/// reported as user-installed.
const BUNDLED: &[&str] = &["npm", "corepack"];

/// Enumerate globally-installed npm packages inside an installation root,
/// descending into `@scope` directories. Bundled packages are excluded.
pub fn global_packages(install_path: &Path) -> Result<Vec<String>, ProviderError> {
    let modules_dir = if is_windows_platform(current_platform()) {
        install_path.join("node_modules")
    } else {
        install_path.join("lib").join("node_modules")
    };

    let entries = match std::fs::read_dir(&modules_dir) {
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

        if let Some(scope) = name.strip_prefix('@') {
            for scoped in std::fs::read_dir(entry.path())?.flatten() {
                if let Some(package) = scoped.file_name().to_str() {
                    packages.push(format!("@{scope}/{package}"));
                }
            }
        } else if !BUNDLED.contains(&name) {
            packages.push(name.to_string());
        }
    }

    packages.sort();
    Ok(packages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(windows))]
    #[test]
    fn bundled_packages_are_excluded_and_scopes_expanded() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let modules = temp.path().join("lib/node_modules");
        for dir in ["npm", "corepack", "typescript", "@angular/cli"] {
            std::fs::create_dir_all(modules.join(dir)).unwrap();
        }

        let packages = global_packages(temp.path()).unwrap();
        assert_eq!(packages, ["@angular/cli", "typescript"]);
    }

    #[test]
    fn missing_modules_directory_is_an_empty_list() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        assert!(global_packages(temp.path()).unwrap().is_empty());
    }
}
