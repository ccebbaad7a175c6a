//! # Archie Core Storage
//!
//! Reading module manifests from disk. The manifest format is picked from the
//! file extension; JSON is always available, YAML and TOML behind the
//! `yaml-config` and `toml-config` features.
pub mod config;
pub mod error;

pub use config::{ManifestFormat, parse_manifest, read_manifest};
pub use error::StorageSystemError;

// Test module declaration
#[cfg(test)]
mod tests;
