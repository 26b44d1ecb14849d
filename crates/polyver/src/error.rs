use thiserror::Error;

use polyver_backend::{ProviderError, RegistryError};
use polyver_core::AppPathsError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Unknown runtime {0:?} (expected one of: node, python, ruby)")]
    UnknownRuntime(String),

    #[error("Unknown shim {0:?}")]
    UnknownShim(String),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Paths(#[from] AppPathsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
