//! Override store adapters.

mod file;

pub use file::FileStatusOverrideStore;
