use std::ffi::OsStr;
use std::path::Path;

use polyver_core::InstallType;

/// Outcome of making the shims directory discoverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStatus {
    AlreadyOnPath,
    InstructionsPrinted,
}

/// Seam for making a directory reachable from newly-started shells. The
/// shipped implementation instructs rather than edits shell profiles;
/// a future platform-specific installer can replace it behind this trait.
pub trait EnsureDiscoverable {
    /// Idempotent: a directory already on PATH is left untouched.
    ///
    /// # Errors
    /// Returns an IO error when the environment cannot be inspected.
    fn ensure_discoverable(
        &self,
        dir: &Path,
        install_type: InstallType,
    ) -> std::io::Result<PathStatus>;
}

pub struct InstructionalPathInstaller;

impl EnsureDiscoverable for InstructionalPathInstaller {
    fn ensure_discoverable(
        &self,
        dir: &Path,
        install_type: InstallType,
    ) -> std::io::Result<PathStatus> {
        let path_var = std::env::var_os("PATH").unwrap_or_default();
        if path_contains(&path_var, dir) {
            return Ok(PathStatus::AlreadyOnPath);
        }

        println!("Add the shims directory to your PATH:");
        if cfg!(windows) {
            match install_type {
                InstallType::User => {
                    println!("  setx PATH \"{};%PATH%\"", dir.display());
                }
                InstallType::System => {
                    println!(
                        "  add {} under System Properties > Environment Variables (requires elevation)",
                        dir.display()
                    );
                }
            }
        } else {
            println!("  export PATH=\"{}:$PATH\"", dir.display());
            println!("  (append the line to your shell profile to make it permanent)");
        }
        Ok(PathStatus::InstructionsPrinted)
    }
}

fn path_contains(path_var: &OsStr, dir: &Path) -> bool {
    std::env::split_paths(path_var).any(|entry| entry == dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn membership_check_compares_whole_entries() {
        let dir = Path::new("/home/u/.local/share/polyver/shims");
        let on_path: OsString =
            std::env::join_paths([Path::new("/usr/bin"), dir]).unwrap();
        let off_path: OsString =
            std::env::join_paths([Path::new("/usr/bin"), Path::new("/home/u")]).unwrap();

        assert!(path_contains(&on_path, dir));
        assert!(!path_contains(&off_path, dir));
    }
}
