use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use futures::FutureExt;

use crate::plugin_system::error::Result;
use crate::plugin_system::manifest::ModuleConfig;
use crate::plugin_system::registry::{ImportMap, ServiceMap};

/// A constructed service value. The core never inspects it.
pub type ServiceInstance = Arc<dyn Any + Send + Sync>;

/// Result of invoking a [`ServiceFactory`].
pub enum Construction {
    /// The instance is available immediately.
    Ready(ServiceInstance),
    /// The instance settles later; the engine joins all of these at the end.
    Pending(BoxFuture<'static, Result<ServiceInstance>>),
}

impl Construction {
    pub fn ready<T: Any + Send + Sync>(value: T) -> Self {
        Construction::Ready(Arc::new(value))
    }

    pub fn pending<T, F>(future: F) -> Self
    where
        T: Any + Send + Sync,
        F: Future<Output = Result<T>> + Send + 'static,
    {
        Construction::Pending(
            future
                .map(|settled| settled.map(|value| Arc::new(value) as ServiceInstance))
                .boxed(),
        )
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Construction::Pending(_))
    }
}

impl fmt::Debug for Construction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Construction::Ready(_) => f.write_str("Construction::Ready(..)"),
            Construction::Pending(_) => f.write_str("Construction::Pending(..)"),
        }
    }
}

/// A loadable unit that builds one service.
///
/// Under the singleton policy the engine calls [`construct`](Self::construct)
/// exactly once per module instantiation. Under the factory policy the factory
/// itself is handed to consumers, who may construct as many instances as they like.
pub trait ServiceFactory: Send + Sync {
    fn construct(&self, config: &ModuleConfig, imports: &ImportMap) -> Result<Construction>;
}

impl<F> ServiceFactory for F
where
    F: Fn(&ModuleConfig, &ImportMap) -> Result<Construction> + Send + Sync,
{
    fn construct(&self, config: &ModuleConfig, imports: &ImportMap) -> Result<Construction> {
        self(config, imports)
    }
}

/// Result of an imperative module setup entry point.
pub enum SetupOutcome {
    Ready(ServiceMap),
    Pending(BoxFuture<'static, Result<ServiceMap>>),
}

impl SetupOutcome {
    pub fn pending<F>(future: F) -> Self
    where
        F: Future<Output = Result<ServiceMap>> + Send + 'static,
    {
        SetupOutcome::Pending(future.boxed())
    }
}

impl fmt::Debug for SetupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupOutcome::Ready(map) => f.debug_tuple("SetupOutcome::Ready").field(map).finish(),
            SetupOutcome::Pending(_) => f.write_str("SetupOutcome::Pending(..)"),
        }
    }
}

/// Entry point of a module that registers its services itself instead of
/// declaring them as a mapping.
pub trait ModuleSetup: Send + Sync {
    fn setup(&self, config: &ModuleConfig, imports: &ImportMap) -> Result<SetupOutcome>;
}

impl<F> ModuleSetup for F
where
    F: Fn(&ModuleConfig, &ImportMap) -> Result<SetupOutcome> + Send + Sync,
{
    fn setup(&self, config: &ModuleConfig, imports: &ImportMap) -> Result<SetupOutcome> {
        self(config, imports)
    }
}
