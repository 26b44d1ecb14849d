//! The Ruby runtime provider: per-installation gem home, bundler/rake shim
//! ownership, and discovery of rbenv, rvm, or system interpreters.

mod provider;

pub use provider::RubyProvider;
