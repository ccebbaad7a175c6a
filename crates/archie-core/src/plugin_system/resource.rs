//! # External Resource Enhancer
//!
//! [`ResourceEnhancer`] decorates another [`Enhancer`] for modules whose
//! services share one external connection (a database client, a message
//! broker). It validates the module's `server` settings up front, opens the
//! connection before the inner enhancer builds any service, and exposes the
//! owned [`ResourceHandle`] to leaf factories through the import map.
//!
//! The handle is released by calling [`ResourceEnhancer::close`] during the
//! application's orderly shutdown.
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::plugin_system::enhancer::Enhancer;
use crate::plugin_system::error::{PluginSystemError, Result};
use crate::plugin_system::loader::ModuleLoader;
use crate::plugin_system::manifest::{InstantiationPolicy, ModuleConfig, ModuleManifest};
use crate::plugin_system::registry::{ImportMap, ServiceEntry, ServiceMap};

/// Import name under which the open handle is exposed by default.
pub const DEFAULT_CLIENT_IMPORT: &str = "client";

pub const SETTINGS_HELP: &str = "Your module config should have the following fields:

  {
    \"server\": {
      \"uri\": URI,
      \"username\" / \"user\": optional,
      \"password\" / \"pass\": optional
    }
  }";

/// Connection settings read from a module's `server` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSettings {
    pub uri: String,
    pub user: String,
    pub password: String,
    /// Verbose diagnostics for the connection, from the module's `debug` setting.
    pub debug: bool,
}

impl ResourceSettings {
    pub fn from_settings(module: &str, settings: &Map<String, Value>) -> Result<Self> {
        let server = settings
            .get("server")
            .and_then(Value::as_object)
            .ok_or_else(|| missing(module, "module should specify a server"))?;

        let uri = string_field(server, &["uri"]);
        if uri.is_empty() {
            return Err(missing(module, "server should have a uri"));
        }

        Ok(Self {
            uri,
            user: string_field(server, &["username", "user"]),
            password: string_field(server, &["password", "pass"]),
            debug: settings.get("debug").and_then(Value::as_bool).unwrap_or(false),
        })
    }
}

fn missing(module: &str, message: &str) -> PluginSystemError {
    PluginSystemError::configuration(module, format!("{}.\n{}", message, SETTINGS_HELP))
}

fn string_field(object: &Map<String, Value>, aliases: &[&str]) -> String {
    aliases
        .iter()
        .find_map(|alias| object.get(*alias).and_then(Value::as_str))
        .unwrap_or_default()
        .to_string()
}

/// An open connection owned by the module that opened it.
#[async_trait]
pub trait ResourceHandle: Send + Sync {
    /// Release the connection. Called at most once by [`ResourceEnhancer`].
    async fn close(&self) -> Result<()>;
}

/// Opens connections described by [`ResourceSettings`].
#[async_trait]
pub trait ResourceConnector: Send + Sync {
    async fn open(&self, settings: &ResourceSettings) -> Result<Arc<dyn ResourceHandle>>;
}

/// Look up the handle a [`ResourceEnhancer`] exposed under `name`.
pub fn client(imports: &ImportMap, name: &str) -> Option<Arc<dyn ResourceHandle>> {
    imports
        .get_instance::<Arc<dyn ResourceHandle>>(name)
        .map(|handle| Arc::clone(handle.as_ref()))
}

pub struct ResourceEnhancer<E, C> {
    inner: E,
    connector: C,
    import_name: String,
    handle: Mutex<Option<Arc<dyn ResourceHandle>>>,
}

impl<E: Enhancer, C: ResourceConnector> ResourceEnhancer<E, C> {
    pub fn new(inner: E, connector: C) -> Self {
        Self {
            inner,
            connector,
            import_name: DEFAULT_CLIENT_IMPORT.to_string(),
            handle: Mutex::new(None),
        }
    }

    /// Expose the handle to factories under `name` instead of `client`.
    pub fn with_import_name(mut self, name: impl Into<String>) -> Self {
        self.import_name = name.into();
        self
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }

    /// The currently open handle, if `setup_plugin` succeeded and `close` was not called yet.
    pub async fn handle(&self) -> Option<Arc<dyn ResourceHandle>> {
        self.handle.lock().await.clone()
    }

    /// Release the held handle. Closing twice is a no-op; afterwards the
    /// module may be set up again.
    pub async fn close(&self) -> Result<()> {
        let handle = self.handle.lock().await.take();
        match handle {
            Some(handle) => {
                log::info!("{}: closing resource", self.inner.name());
                handle.close().await
            }
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<E: Enhancer, C: ResourceConnector> Enhancer for ResourceEnhancer<E, C> {
    fn name(&self) -> &str {
        "resource"
    }

    fn default_policy(&self) -> InstantiationPolicy {
        self.inner.default_policy()
    }

    fn resolve_config(&self, manifest: ModuleManifest, base: &Path) -> Result<ModuleConfig> {
        let module = manifest.package_path.clone().unwrap_or_default();
        ResourceSettings::from_settings(&module, &manifest.settings)?;
        self.inner.resolve_config(manifest, base)
    }

    async fn setup_plugin(
        &self,
        config: &ModuleConfig,
        mut imports: ImportMap,
        loader: &dyn ModuleLoader,
    ) -> Result<ServiceMap> {
        let settings = ResourceSettings::from_settings(&config.name(), &config.settings)?;

        // The slot stays locked until the handle is stored, so concurrent
        // setups cannot both open a connection.
        let handle = {
            let mut slot = self.handle.lock().await;
            if slot.is_some() {
                return Err(PluginSystemError::configuration(
                    config.name(),
                    "resource is already open; close it before setting the module up again",
                ));
            }
            log::debug!("{}: opening resource at {}", self.name(), settings.uri);
            let handle = self.connector.open(&settings).await?;
            *slot = Some(Arc::clone(&handle));
            handle
        };

        imports.insert(self.import_name.clone(), ServiceEntry::instance(Arc::clone(&handle)));

        match self.inner.setup_plugin(config, imports, loader).await {
            Ok(services) => Ok(services),
            Err(e) => {
                // Release only the handle this setup opened
                let owned = {
                    let mut slot = self.handle.lock().await;
                    let ours = slot.as_ref().is_some_and(|held| Arc::ptr_eq(held, &handle));
                    if ours {
                        slot.take()
                    } else {
                        None
                    }
                };
                if let Some(owned) = owned {
                    if let Err(close_err) = owned.close().await {
                        log::warn!("{}: failed to close resource after setup error: {}", self.name(), close_err);
                    }
                }
                Err(e)
            }
        }
    }
}
