//! # Archie Core Utilities
//!
//! Small helpers shared by the plugin system. Currently this is the lexical
//! path resolution used to turn relative leaf declarations into absolute
//! service locations.
pub mod path;

pub use path::{normalize_lexically, resolve_location};
