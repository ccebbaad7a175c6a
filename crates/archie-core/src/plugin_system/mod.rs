//! # Archie Core Plugin System
//!
//! Turns declarative module descriptions into assembled services.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`declaration`]**: the raw, possibly nested [`ServiceDeclaration`] tree.
//! - **[`normalizer`]**: flattens a declaration into ordered flat names and a
//!   [`ProvidesMap`] of absolute locations.
//! - **[`manifest`]**: the authored [`ModuleManifest`] and the resolved
//!   [`ModuleConfig`] produced from it.
//! - **[`traits`]**: [`ServiceFactory`] and [`ModuleSetup`], the units a loader hands out.
//! - **[`loader`]**: the [`ModuleLoader`] capability and an in-process implementation.
//! - **[`registry`]**: [`ServiceMap`] and [`ImportMap`].
//! - **[`engine`]**: the two-pass instantiation algorithm.
//! - **[`enhancer`]**: the [`Enhancer`] capability and [`BaseEnhancer`].
//! - **[`resource`]**: a decorating enhancer that owns an external connection.
//! - **[`error`]**: [`PluginSystemError`](error::PluginSystemError).
pub mod declaration;
pub mod engine;
pub mod enhancer;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod normalizer;
pub mod registry;
pub mod resource;
pub mod traits;

pub use declaration::ServiceDeclaration;
pub use engine::instantiate;
pub use enhancer::{BaseEnhancer, Enhancer};
pub use error::{PluginSystemError, Result};
pub use loader::{ModuleLoader, StaticModuleLoader};
pub use manifest::{InstantiationPolicy, ManifestBuilder, ModuleConfig, ModuleManifest};
pub use normalizer::{normalize, FlatName, Normalized, ProvidedService, ProvidesMap};
pub use registry::{ImportMap, ServiceEntry, ServiceMap, ServiceNamespace};
pub use resource::{ResourceConnector, ResourceEnhancer, ResourceHandle, ResourceSettings};
pub use traits::{Construction, ModuleSetup, ServiceFactory, ServiceInstance, SetupOutcome};

// Test module declaration
#[cfg(test)]
mod tests;
