//! The layered manifest lookup: embedded default, remote authority, disk
//! cache with TTL, and the fallback composition that prefers fresh data but
//! degrades to stale or embedded manifests rather than failing.

mod cached;
mod chain;
mod embedded;
mod fallback;
mod http;
mod source;
mod types;

pub use cached::{CachedSource, DEFAULT_CACHE_TTL_HOURS};
pub use chain::default_chain;
pub use embedded::EmbeddedSource;
pub use fallback::FallbackSource;
pub use http::{DEFAULT_REMOTE_URL, HttpSource};
pub use source::ManifestSource;
pub use types::{
    DownloadDescriptor, FetchedManifest, Manifest, ManifestDocument, ManifestError, SCHEMA_VERSION,
};
