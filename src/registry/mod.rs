//! npm registry checking.

pub mod cache;
pub mod npm;

pub use cache::RegistryCache;
pub use npm::NpmChecker;
