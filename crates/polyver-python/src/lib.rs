//! The CPython runtime provider: standalone-build archive layout, pip shim
//! ownership, site-packages enumeration, and discovery of pyenv or system
//! interpreters.

mod packages;
mod provider;

pub use provider::PythonProvider;
