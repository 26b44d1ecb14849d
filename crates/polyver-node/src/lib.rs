//! The Node.js runtime provider: official-distribution archive layout,
//! npm/corepack shim ownership, and discovery of installs made by nvm, fnm,
//! or the system package manager.

mod detection;
mod packages;
mod provider;

pub use provider::NodeProvider;
