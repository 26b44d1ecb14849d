use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use polyver_core::Version;

/// The wire schema version this build understands. Anything else is a hard
/// incompatibility, never guessed around.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("Unsupported manifest schema version {found} (expected {SCHEMA_VERSION})")]
    SchemaVersion { found: u32 },

    #[error("Failed to parse manifest from {origin}: {details}")]
    Parse {
        origin: &'static str,
        details: String,
    },

    #[error("Manifest request to {url} failed: {details}")]
    Request { url: String, details: String },

    #[error("Manifest request to {url} returned HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("IO error ({kind}): {message}")]
    Io {
        kind: std::io::ErrorKind,
        message: String,
    },
}

impl From<std::io::Error> for ManifestError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Where one `(version, platform)` artifact can be fetched from. A missing
/// checksum means the upstream does not publish one; verification is then
/// skipped with a warning, never silently assumed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadDescriptor {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

/// The on-wire manifest document: schema version plus descriptors keyed by
/// runtime, version string, and platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestDocument {
    pub version: u32,
    #[serde(default)]
    pub versions: BTreeMap<String, BTreeMap<String, BTreeMap<String, DownloadDescriptor>>>,
}

impl ManifestDocument {
    /// Parse a document and validate its schema version.
    ///
    /// # Errors
    /// Returns `Parse` for malformed JSON and `SchemaVersion` for a schema
    /// this build does not understand.
    pub fn from_json(data: &str, origin: &'static str) -> Result<Self, ManifestError> {
        let document: Self =
            serde_json::from_str(data).map_err(|err| ManifestError::Parse {
                origin,
                details: err.to_string(),
            })?;
        if document.version != SCHEMA_VERSION {
            return Err(ManifestError::SchemaVersion {
                found: document.version,
            });
        }
        Ok(document)
    }

    /// Extract the snapshot for one runtime. A runtime absent from the
    /// document yields an empty manifest, which callers can query freely.
    #[must_use]
    pub fn manifest_for(&self, runtime: &str) -> Manifest {
        Manifest {
            versions: self.versions.get(runtime).cloned().unwrap_or_default(),
        }
    }
}

/// A manifest together with the source layer that produced it, so callers
/// can report provenance (remote, cache, embedded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedManifest {
    pub manifest: Manifest,
    pub origin: &'static str,
}

/// An immutable per-runtime snapshot: version string to platform to download
/// descriptor. Absence of an entry is a queryable `None`, not an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub versions: BTreeMap<String, BTreeMap<String, DownloadDescriptor>>,
}

impl Manifest {
    #[must_use]
    pub fn descriptor(&self, version: &str, platform: &str) -> Option<&DownloadDescriptor> {
        self.versions.get(version)?.get(platform)
    }

    /// All parseable versions with an artifact for `platform`, unsorted.
    /// Entries that fail to parse are skipped with a warning.
    #[must_use]
    pub fn versions_for_platform(&self, platform: &str) -> Vec<Version> {
        self.versions
            .iter()
            .filter(|(_, platforms)| platforms.contains_key(platform))
            .filter_map(|(version, _)| match version.parse() {
                Ok(parsed) => Some(parsed),
                Err(err) => {
                    log::warn!("Skipping unparsable manifest version {version:?}: {err}");
                    None
                }
            })
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}
