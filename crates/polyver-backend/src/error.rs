use std::path::PathBuf;

use thiserror::Error;

use polyver_core::{ConfigError, ResolveError, VersionParseError};
use polyver_manifest::ManifestError;

/// The provider-layer error taxonomy. Kinds surface to the command layer
/// verbatim; manifest-chain failures are absorbed by the chain itself and
/// only total exhaustion appears here as `SourceUnavailable`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("No version matching {input:?} found")]
    NoMatchingVersion { input: String },

    #[error("Version {version} of {runtime} is not available for {platform}")]
    VersionNotFound {
        runtime: &'static str,
        version: String,
        platform: String,
    },

    #[error("No manifest source could be reached for {runtime}: {details}")]
    SourceUnavailable {
        runtime: &'static str,
        details: String,
    },

    #[error("Checksum mismatch for {url}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("Version {version} is already installed")]
    AlreadyInstalled { version: String },

    #[error("Version {version} is not installed")]
    NotInstalled { version: String },

    #[error("No {runtime} version is selected (set one with `polyver global {runtime} <version>`)")]
    NoActiveVersion { runtime: &'static str },

    #[error("Selected {runtime} version {version} is not installed (run `polyver install {runtime} {version}`)")]
    SelectedVersionNotInstalled {
        runtime: &'static str,
        version: String,
    },

    #[error("Corrupt config file {path}: {details}")]
    ConfigCorrupt { path: PathBuf, details: String },

    #[error("Installation failed during {phase}: {details}")]
    InstallFailed {
        phase: &'static str,
        details: String,
    },

    #[error("Network error fetching {url}: {details}")]
    Network { url: String, details: String },

    #[error(transparent)]
    VersionParse(#[from] VersionParseError),

    #[error("IO error ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl ProviderError {
    pub fn install_failed(phase: &'static str, details: impl Into<String>) -> Self {
        Self::InstallFailed {
            phase,
            details: details.into(),
        }
    }

    pub fn network(url: impl Into<String>, details: impl std::fmt::Display) -> Self {
        Self::Network {
            url: url.into(),
            details: details.to_string(),
        }
    }

    /// Map a manifest-chain failure to the provider-layer kind. Only called
    /// once every layer of the chain has failed.
    #[must_use]
    pub fn source_unavailable(runtime: &'static str, error: &ManifestError) -> Self {
        Self::SourceUnavailable {
            runtime,
            details: error.to_string(),
        }
    }
}

impl From<std::io::Error> for ProviderError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for ProviderError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Corrupt { path, details } => Self::ConfigCorrupt { path, details },
            ConfigError::Io { kind, message } => Self::Io { kind, message },
        }
    }
}

impl From<ResolveError> for ProviderError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoMatchingVersion { input } => Self::NoMatchingVersion { input },
        }
    }
}
