//! # Archie Core Plugin System Errors
//!
//! Defines [`PluginSystemError`], the error taxonomy shared by the declaration
//! normalizer and the instantiation engine:
//!
//! - configuration errors (missing `base`/`packagePath`, malformed keys,
//!   ambiguous module shape) are raised before any loading begins,
//! - load errors are raised when a declared location cannot be turned into a
//!   factory,
//! - construction errors are raised when a factory fails synchronously or its
//!   pending result fails.
//!
//! No error is recovered from inside the core; everything bubbles to the caller.
use std::path::PathBuf;

use crate::storage::error::StorageSystemError;

type BoxedSource = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("Configuration error in module '{module}': {message}")]
    ConfigurationError {
        module: String,
        message: String,
    },

    #[error("Failed to load service from '{}': {message}", location.display())]
    LoadError {
        location: PathBuf,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Construction of service '{service}' failed: {message}")]
    ConstructionError {
        service: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Service '{name}' is declared more than once")]
    DuplicateService { name: String },

    #[error("Manifest storage error: {0}")]
    Storage(#[from] StorageSystemError),
}

impl PluginSystemError {
    pub fn configuration(module: impl Into<String>, message: impl Into<String>) -> Self {
        PluginSystemError::ConfigurationError {
            module: module.into(),
            message: message.into(),
        }
    }

    pub fn load(location: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        PluginSystemError::LoadError {
            location: location.into(),
            message: message.into(),
            source: None,
        }
    }

    pub fn construction(service: impl Into<String>, message: impl Into<String>) -> Self {
        PluginSystemError::ConstructionError {
            service: service.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an arbitrary error raised by a factory while building `service`.
    pub fn construction_from<E>(service: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PluginSystemError::ConstructionError {
            service: service.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, PluginSystemError::ConfigurationError { .. })
    }

    pub fn is_load(&self) -> bool {
        matches!(self, PluginSystemError::LoadError { .. })
    }

    pub fn is_construction(&self) -> bool {
        matches!(self, PluginSystemError::ConstructionError { .. })
    }
}

/// Shorthand for Result with the plugin system error type
pub type Result<T> = std::result::Result<T, PluginSystemError>;
