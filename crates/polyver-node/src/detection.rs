use std::path::Path;

use polyver_backend::DetectedInstallation;

/// Best-effort discovery of Node.js installations owned by other tools.
/// Purely advisory: anything unreadable is silently skipped.
pub fn detect_node_installations() -> Vec<DetectedInstallation> {
    let mut found = Vec::new();

    if let Some(home) = dirs::home_dir() {
        collect_version_dirs(&home.join(".nvm/versions/node"), "nvm", &mut found);
    }
    if let Some(data) = dirs::data_dir() {
        collect_version_dirs(&data.join("fnm/node-versions"), "fnm", &mut found);
    }

    if let Ok(path) = which::which("node") {
        found.push(DetectedInstallation {
            manager: "system".to_string(),
            version: None,
            path,
        });
    }

    found
}

/// Scan a `<root>/<vX.Y.Z>` layout shared by nvm and fnm.
fn collect_version_dirs(root: &Path, manager: &str, found: &mut Vec<DetectedInstallation>) {
    let Ok(entries) = std::fs::read_dir(root) else {
        return;
    };
    for entry in entries.flatten() {
        if !entry.path().is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        found.push(DetectedInstallation {
            manager: manager.to_string(),
            version: Some(name.trim_start_matches('v').to_string()),
            path: entry.path(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_dirs_are_collected_with_the_v_prefix_stripped() {
        let temp = tempfile::tempdir().expect("temporary directory should be created");
        let root = temp.path().join("versions/node");
        std::fs::create_dir_all(root.join("v22.15.1")).unwrap();
        std::fs::create_dir_all(root.join("v18.19.0")).unwrap();
        std::fs::write(root.join("not-a-dir"), "").unwrap();

        let mut found = Vec::new();
        collect_version_dirs(&root, "nvm", &mut found);

        let mut versions: Vec<_> = found.iter().filter_map(|d| d.version.clone()).collect();
        versions.sort();
        assert_eq!(versions, ["18.19.0", "22.15.1"]);
        assert!(found.iter().all(|d| d.manager == "nvm"));
    }

    #[test]
    fn missing_root_detects_nothing() {
        let mut found = Vec::new();
        collect_version_dirs(Path::new("/nonexistent/versions"), "fnm", &mut found);
        assert!(found.is_empty());
    }
}
