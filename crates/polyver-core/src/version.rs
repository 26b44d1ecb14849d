use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A concrete runtime version: numeric triple plus an optional pre-release
/// tag. Pre-release versions order below their corresponding release.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
    pub pre: Option<String>,
}

impl Version {
    #[must_use]
    pub fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: None,
        }
    }

    #[must_use]
    pub fn with_pre(major: u32, minor: u32, patch: u32, pre: impl Into<String>) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Some(pre.into()),
        }
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.pre, &other.pre) {
                (None, None) => Ordering::Equal,
                // A release sorts above any of its pre-releases.
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(a), Some(b)) => a.cmp(b),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.pre {
            write!(f, "-{pre}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    #[error("Expected X.Y.Z format, got: {input}")]
    InvalidFormat { input: String },
    #[error("Invalid numeric component {value:?} in version {input:?}")]
    InvalidComponent { input: String, value: String },
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let body = trimmed.strip_prefix('v').unwrap_or(trimmed);

        let (numeric, pre) = match body.split_once('-') {
            Some((numeric, pre)) if !pre.is_empty() => (numeric, Some(pre.to_string())),
            Some(_) => {
                return Err(VersionParseError::InvalidFormat {
                    input: body.to_string(),
                });
            }
            None => (body, None),
        };

        let mut parts = numeric.split('.');
        let mut component = || {
            let value = parts.next().ok_or_else(|| VersionParseError::InvalidFormat {
                input: body.to_string(),
            })?;
            value
                .parse::<u32>()
                .map_err(|_| VersionParseError::InvalidComponent {
                    input: body.to_string(),
                    value: value.to_string(),
                })
        };

        let major = component()?;
        let minor = component()?;
        let patch = component()?;
        if parts.next().is_some() {
            return Err(VersionParseError::InvalidFormat {
                input: body.to_string(),
            });
        }

        Ok(Self {
            major,
            minor,
            patch,
            pre,
        })
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.to_string()
    }
}

impl TryFrom<String> for Version {
    type Error = VersionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("No version matching {input:?} found")]
    NoMatchingVersion { input: String },
}

/// Whether the input names fewer than three version components (after an
/// optional `v` prefix), i.e. needs resolution against a candidate list.
#[must_use]
pub fn is_partial_version(input: &str) -> bool {
    let body = input.trim().strip_prefix('v').unwrap_or(input.trim());
    let numeric = body.split_once('-').map_or(body, |(numeric, _)| numeric);
    numeric.split('.').count() < 3
}

/// Resolve a user-supplied version spec against a candidate list.
///
/// A full three-component input passes through verbatim (prefix stripped)
/// without membership validation; the caller decides whether existence
/// matters. A one- or two-component input selects the maximum candidate
/// whose leading components match numerically.
///
/// # Errors
/// Returns `ResolveError::NoMatchingVersion` when a partial input matches no
/// candidate (an empty candidate list included).
pub fn resolve_version(input: &str, available: &[Version]) -> Result<String, ResolveError> {
    let trimmed = input.trim();
    let body = trimmed.strip_prefix('v').unwrap_or(trimmed);

    if !is_partial_version(body) {
        return Ok(body.to_string());
    }

    let components: Vec<u32> = body
        .split('.')
        .map(|part| {
            part.parse::<u32>()
                .map_err(|_| ResolveError::NoMatchingVersion {
                    input: body.to_string(),
                })
        })
        .collect::<Result<_, _>>()?;

    available
        .iter()
        .filter(|candidate| matches_prefix(candidate, &components))
        .max()
        .map(ToString::to_string)
        .ok_or_else(|| ResolveError::NoMatchingVersion {
            input: body.to_string(),
        })
}

fn matches_prefix(candidate: &Version, components: &[u32]) -> bool {
    components
        .iter()
        .zip([candidate.major, candidate.minor, candidate.patch])
        .all(|(want, have)| *want == have)
}
