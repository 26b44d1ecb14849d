/// The `<os>-<arch>` identifier joining manifest entries to the running
/// host, e.g. `linux-amd64`, `darwin-arm64`, `windows-386`.
#[must_use]
pub fn current_platform() -> &'static str {
    if cfg!(target_os = "linux") && cfg!(target_arch = "x86_64") {
        "linux-amd64"
    } else if cfg!(target_os = "linux") && cfg!(target_arch = "aarch64") {
        "linux-arm64"
    } else if cfg!(target_os = "macos") && cfg!(target_arch = "x86_64") {
        "darwin-amd64"
    } else if cfg!(target_os = "macos") && cfg!(target_arch = "aarch64") {
        "darwin-arm64"
    } else if cfg!(target_os = "windows") && cfg!(target_arch = "x86_64") {
        "windows-amd64"
    } else if cfg!(target_os = "windows") && cfg!(target_arch = "aarch64") {
        "windows-arm64"
    } else if cfg!(target_os = "windows") && cfg!(target_arch = "x86") {
        "windows-386"
    } else {
        "unknown"
    }
}

#[must_use]
pub fn is_windows_platform(platform: &str) -> bool {
    platform.starts_with("windows-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_platform_is_a_known_join_key_or_the_bare_fallback() {
        let platform = current_platform();
        if platform == "unknown" {
            // Unmatched target triple: manifest lookups will simply miss.
            return;
        }
        let (os, arch) = platform.split_once('-').expect("os-arch pair");
        assert!(["linux", "darwin", "windows"].contains(&os));
        assert!(["amd64", "arm64", "386"].contains(&arch));
    }

    #[test]
    fn windows_platforms_are_detected() {
        assert!(is_windows_platform("windows-amd64"));
        assert!(is_windows_platform("windows-386"));
        assert!(!is_windows_platform("linux-amd64"));
    }
}
