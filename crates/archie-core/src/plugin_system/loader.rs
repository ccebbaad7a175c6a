use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::plugin_system::error::{PluginSystemError, Result};
use crate::plugin_system::traits::{ModuleSetup, ServiceFactory};
use crate::utils::path::normalize_lexically;

/// Turns an absolute service location into something the engine can invoke.
///
/// Implementations must be deterministic and free of side effects beyond the
/// load itself; the engine may call them for many modules concurrently.
pub trait ModuleLoader: Send + Sync {
    /// Load the factory of a leaf service.
    fn load(&self, location: &Path) -> Result<Arc<dyn ServiceFactory>>;

    /// Load the setup entry point of an imperative module.
    fn load_setup(&self, location: &Path) -> Result<Arc<dyn ModuleSetup>> {
        Err(PluginSystemError::load(
            location,
            "this loader does not provide setup entry points",
        ))
    }
}

/// Loader backed by factories registered in-process, keyed by location.
///
/// Locations are compared after lexical normalization, so `/a/./b` and
/// `/a/b` name the same unit.
#[derive(Default)]
pub struct StaticModuleLoader {
    factories: HashMap<PathBuf, Arc<dyn ServiceFactory>>,
    setups: HashMap<PathBuf, Arc<dyn ModuleSetup>>,
}

impl StaticModuleLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the factory served for `location`, replacing any previous one.
    pub fn register_factory<F>(&mut self, location: impl AsRef<Path>, factory: F) -> &mut Self
    where
        F: ServiceFactory + 'static,
    {
        let key = normalize_lexically(location.as_ref());
        log::debug!("Registering service factory at {}", key.display());
        self.factories.insert(key, Arc::new(factory));
        self
    }

    pub fn register_setup<S>(&mut self, location: impl AsRef<Path>, setup: S) -> &mut Self
    where
        S: ModuleSetup + 'static,
    {
        let key = normalize_lexically(location.as_ref());
        log::debug!("Registering module setup at {}", key.display());
        self.setups.insert(key, Arc::new(setup));
        self
    }

    pub fn with_factory<F>(mut self, location: impl AsRef<Path>, factory: F) -> Self
    where
        F: ServiceFactory + 'static,
    {
        self.register_factory(location, factory);
        self
    }

    pub fn with_setup<S>(mut self, location: impl AsRef<Path>, setup: S) -> Self
    where
        S: ModuleSetup + 'static,
    {
        self.register_setup(location, setup);
        self
    }

    pub fn has_factory(&self, location: &Path) -> bool {
        self.factories.contains_key(&normalize_lexically(location))
    }

    pub fn factory_count(&self) -> usize {
        self.factories.len()
    }
}

impl ModuleLoader for StaticModuleLoader {
    fn load(&self, location: &Path) -> Result<Arc<dyn ServiceFactory>> {
        self.factories
            .get(&normalize_lexically(location))
            .cloned()
            .ok_or_else(|| PluginSystemError::load(location, "no service is registered at this location"))
    }

    fn load_setup(&self, location: &Path) -> Result<Arc<dyn ModuleSetup>> {
        self.setups
            .get(&normalize_lexically(location))
            .cloned()
            .ok_or_else(|| PluginSystemError::load(location, "no setup entry point is registered at this location"))
    }
}

impl<L: ModuleLoader + ?Sized> ModuleLoader for Arc<L> {
    fn load(&self, location: &Path) -> Result<Arc<dyn ServiceFactory>> {
        (**self).load(location)
    }

    fn load_setup(&self, location: &Path) -> Result<Arc<dyn ModuleSetup>> {
        (**self).load_setup(location)
    }
}
