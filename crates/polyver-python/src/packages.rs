use std::path::Path;

use polyver_backend::ProviderError;

/// Packages every CPython installation carries that should not be reported
/// as user-installed.
const BUNDLED: &[&str] = &["pip", "setuptools", "wheel"];

/// Enumerate user-installed packages by scanning `*.dist-info` entries in
/// every `site-packages` directory under the installation root.
pub fn installed_packages(install_path: &Path) -> Result<Vec<String>, ProviderError> {
    let mut packages = Vec::new();
    for site_packages in site_packages_dirs(install_path) {
        for entry in std::fs::read_dir(&site_packages)?.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            let Some(stem) = name.strip_suffix(".dist-info") else {
                continue;
            };
            // dist-info directories are named `<package>-<version>`.
            let Some((package, _version)) = stem.rsplit_once('-') else {
                continue;
            };
            if !BUNDLED.contains(&package) {
                packages.push(package.to_string());
            }
        }
    }

    packages.sort();
    packages.dedup();
    Ok(packages)
}

/// `lib/python3.X/site-packages` on Unix, `Lib/site-packages` on Windows.
/// Both are probed so the scan works on any extracted layout.
fn site_packages_dirs(install_path: &Path) -> Vec<std::path::PathBuf> {
    let mut dirs = Vec::new();

    let windows_layout = install_path.join("Lib").join("site-packages");
    if windows_layout.is_dir() {
        dirs.push(windows_layout);
    }

    if let Ok(entries) = std::fs::read_dir(install_path.join("lib")) {
        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with("python") {
                let candidate = entry.path().join("site-packages");
                if candidate.is_dir() {
                    dirs.push(candidate);
                }
            }
        }
    }

    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dist_info_entries_are_parsed_and_bundled_tools_excluded() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let site = temp.path().join("lib/python3.12/site-packages");
        for dir in [
            "pip-24.0.dist-info",
            "setuptools-69.0.0.dist-info",
            "requests-2.31.0.dist-info",
            "black-24.4.2.dist-info",
            "requests",
        ] {
            std::fs::create_dir_all(site.join(dir)).unwrap();
        }

        let packages = installed_packages(temp.path()).unwrap();
        assert_eq!(packages, ["black", "requests"]);
    }

    #[test]
    fn installation_without_site_packages_has_no_packages() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        assert!(installed_packages(temp.path()).unwrap().is_empty());
    }
}
