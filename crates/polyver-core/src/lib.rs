//! Core value types and configuration plumbing shared by every polyver crate:
//! - The `Version` value type and partial-version resolution.
//! - Platform identifiers (`<os>-<arch>` join keys).
//! - Application directory layout.
//! - The global/local selection store and installation settings.

mod config;
pub mod fsutil;
mod paths;
mod platform;
mod settings;
mod version;

pub use config::{ConfigError, SelectionStore};
pub use paths::{AppPaths, AppPathsError};
pub use platform::{current_platform, is_windows_platform};
pub use settings::{InstallType, Settings};
pub use version::{
    ResolveError, Version, VersionParseError, is_partial_version, resolve_version,
};
