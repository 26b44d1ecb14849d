//! The runtime provider contract and the machinery shared by every
//! provider: the error taxonomy, the provider registry, installation
//! directory bookkeeping, selection resolution, and the atomic
//! download/verify/extract/activate install pipeline.

mod dirs;
mod error;
mod install;
mod registry;
mod runtime;
mod selection;
mod traits;

pub use dirs::{COMPLETE_MARKER, RuntimeDirs};
pub use error::ProviderError;
pub use install::{download_client, install_from_descriptor};
pub use registry::{ProviderRegistry, RegistryBuilder, RegistryError};
pub use runtime::RuntimeHandle;
pub use selection::Selections;
pub use traits::{AvailableVersion, DetectedInstallation, InstalledVersion, Provider};
